use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};
use tick_core::CancelToken;

use crate::error::ServerError;
use crate::tracker::ConnTracker;

/// Ctrl+C / SIGTERM => отмена для всего процесса
pub(crate) fn install_interrupt_handler(cancel: &CancelToken) -> Result<(), ServerError> {
    let cancel = cancel.clone();
    ctrlc::set_handler(move || {
        info!("interrupt received");
        cancel.cancel();
    })?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Running,
    /// новые соединения не принимаются, ждём текущие
    Draining,
    Terminated,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DrainReport {
    /// сколько соединений было открыто в момент начала дренажа
    pub(crate) drained: usize,
    /// сколько соединений пришлось закрыть по дедлайну
    pub(crate) forced: usize,
}

/// Координатор остановки: Running -> Draining -> Terminated.
pub(crate) struct ShutdownCoordinator {
    cancel: CancelToken,
    tracker: Arc<ConnTracker>,
    drain_timeout: Option<Duration>,
    phase: Mutex<Phase>,
}

impl ShutdownCoordinator {
    pub(crate) fn new(
        cancel: CancelToken,
        tracker: Arc<ConnTracker>,
        drain_timeout: Option<Duration>,
    ) -> Self {
        Self {
            cancel,
            tracker,
            drain_timeout,
            phase: Mutex::new(Phase::Running),
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        match self.phase.lock() {
            Ok(g) => *g,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_phase(&self, phase: Phase) {
        let mut g = match self.phase.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *g = phase;
    }

    /// Блокируется до отмены, затем дренирует: дожидается accept-потока
    /// (listener к этому моменту закрыт) и всех сессий.
    pub(crate) fn run(
        &self,
        accept: JoinHandle<Vec<JoinHandle<()>>>,
    ) -> Result<DrainReport, ServerError> {
        self.cancel.wait();

        self.set_phase(Phase::Draining);
        let drained = self.tracker.outstanding();
        info!("done: draining {drained} connection(s)");

        let sessions = accept.join().map_err(|_| ServerError::AcceptPanicked)?;
        let forced = self.wait_for_drain();

        for h in sessions {
            if let Err(panic) = h.join() {
                warn!("session thread panicked: {:?}", panic);
            }
        }

        self.set_phase(Phase::Terminated);
        Ok(DrainReport { drained, forced })
    }

    fn wait_for_drain(&self) -> usize {
        let Some(deadline) = self.drain_timeout else {
            self.tracker.wait_idle(None);
            return 0;
        };

        if self.tracker.wait_idle(Some(deadline)) {
            return 0;
        }

        let forced = self.tracker.force_close_all();
        warn!("drain deadline {deadline:?} exceeded: force-closed {forced} connection(s)");
        // после shutdown сокета сессии выходят на ближайшей записи
        self.tracker.wait_idle(None);
        forced
    }
}
