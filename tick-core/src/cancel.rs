use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

/// Сигнал отмены на весь процесс.
///
/// Клонируется дёшево, все клоны смотрят на одно состояние. Однажды
/// выставленный, остаётся выставленным навсегда.
///
/// Наблюдать можно двумя способами:
/// - опросом через [`CancelToken::is_cancelled`] в голове цикла;
/// - через [`CancelToken::receiver`] внутри `crossbeam_channel::select!`:
///   при отмене отправитель дропается и канал становится `Disconnected`,
///   что будит всех ожидающих сразу.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    // по этому каналу никогда ничего не шлют, важен только момент drop
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

impl CancelToken {
    /// Новый, ещё не отменённый токен
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
                done: rx,
            }),
        }
    }

    /// Выставить отмену. Повторные вызовы ничего не делают.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);

        let mut trigger = match self.inner.trigger.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        trigger.take();
    }

    /// Была ли отмена
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Канал для `select!`: становится готовым (Disconnected) после отмены
    pub fn receiver(&self) -> &Receiver<()> {
        &self.inner.done
    }

    /// Заблокироваться до отмены
    pub fn wait(&self) {
        // Ok(()) невозможен: в канал никто не пишет
        let _ = self.inner.done.recv();
    }

    /// Подождать отмену не дольше `timeout`. Возвращает `true`, если отмена пришла.
    ///
    /// Удобно как "сон", который прерывается по Ctrl+C.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.inner.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_cancelled(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
