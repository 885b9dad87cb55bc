use std::collections::HashMap;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use log::debug;

use crate::config::ConnId;

/// Учёт живых соединений (аналог WaitGroup).
///
/// Каждая регистрация возвращает [`ConnGuard`]; пока guard жив, соединение
/// считается незавершённым. Для принудительного закрытия при дедлайне
/// остановки трекер держит клон сокета.
pub(crate) struct ConnTracker {
    conns: Mutex<HashMap<ConnId, Option<TcpStream>>>,
    idle: Condvar,
    next_id: AtomicU64,
}

impl ConnTracker {
    pub(crate) fn new() -> Self {
        Self {
            conns: Mutex::new(HashMap::new()),
            idle: Condvar::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnId, Option<TcpStream>>> {
        match self.conns.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(), // продолжаем, несмотря на poison
        }
    }

    /// Зарегистрировать соединение. `closer` - клон сокета для force-close (может не быть).
    pub(crate) fn register(self: &Arc<Self>, closer: Option<TcpStream>) -> ConnGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, closer);
        ConnGuard {
            id,
            tracker: Arc::clone(self),
        }
    }

    fn release(&self, id: ConnId) {
        let mut conns = self.lock();
        conns.remove(&id);
        if conns.is_empty() {
            self.idle.notify_all();
        }
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.lock().len()
    }

    /// Ждать, пока не останется ни одного соединения.
    /// Возвращает `false`, если вышел `timeout`, а соединения ещё есть.
    pub(crate) fn wait_idle(&self, timeout: Option<Duration>) -> bool {
        let conns = self.lock();
        match timeout {
            None => {
                let conns = match self.idle.wait_while(conns, |c| !c.is_empty()) {
                    Ok(g) => g,
                    Err(poisoned) => poisoned.into_inner(),
                };
                conns.is_empty()
            }
            Some(timeout) => {
                let (conns, _) = match self.idle.wait_timeout_while(conns, timeout, |c| !c.is_empty()) {
                    Ok(r) => r,
                    Err(poisoned) => poisoned.into_inner(),
                };
                conns.is_empty()
            }
        }
    }

    /// Закрыть сокеты всех оставшихся соединений. Их сессии увидят ошибку
    /// записи и завершатся сами; счётчик уменьшится, когда упадут их guard'ы.
    pub(crate) fn force_close_all(&self) -> usize {
        let conns = self.lock();
        let mut closed = 0;
        for (id, stream) in conns.iter() {
            if let Some(stream) = stream {
                if let Err(e) = stream.shutdown(Shutdown::Both) {
                    debug!("conn {id}: force close failed: {e}");
                }
                closed += 1;
            }
        }
        closed
    }
}

/// Живая регистрация соединения. Drop = соединение завершено.
pub(crate) struct ConnGuard {
    id: ConnId,
    tracker: Arc<ConnTracker>,
}

impl ConnGuard {
    pub(crate) fn id(&self) -> ConnId {
        self.id
    }
}

impl Drop for ConnGuard {
    fn drop(&mut self) {
        self.tracker.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn register_and_drop_update_outstanding_count() {
        let tracker = Arc::new(ConnTracker::new());
        assert_eq!(tracker.outstanding(), 0);

        let a = tracker.register(None);
        let b = tracker.register(None);
        assert_ne!(a.id(), b.id());
        assert_eq!(tracker.outstanding(), 2);

        drop(a);
        assert_eq!(tracker.outstanding(), 1);
        drop(b);
        assert_eq!(tracker.outstanding(), 0);
    }

    #[test]
    fn wait_idle_returns_immediately_when_nothing_registered() {
        let tracker = ConnTracker::new();
        assert!(tracker.wait_idle(None));
        assert!(tracker.wait_idle(Some(Duration::from_millis(1))));
    }

    #[test]
    fn wait_idle_blocks_until_last_guard_dropped() {
        let tracker = Arc::new(ConnTracker::new());
        let guard = tracker.register(None);

        let h = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            drop(guard);
        });

        let started = Instant::now();
        assert!(tracker.wait_idle(None));
        assert!(started.elapsed() >= Duration::from_millis(90));
        h.join().unwrap();
    }

    #[test]
    fn wait_idle_times_out_while_connections_remain() {
        let tracker = Arc::new(ConnTracker::new());
        let _guard = tracker.register(None);

        assert!(!tracker.wait_idle(Some(Duration::from_millis(50))));
        assert_eq!(tracker.outstanding(), 1);
    }

    #[test]
    fn force_close_all_unblocks_peer_reads() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();

        let tracker = Arc::new(ConnTracker::new());
        let _guard = tracker.register(Some(server.try_clone().unwrap()));
        let _no_socket = tracker.register(None);

        assert_eq!(tracker.force_close_all(), 1);

        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut buf = [0u8; 16];
        // сервер закрыл свою сторону => клиент видит EOF
        assert_eq!(client.read(&mut buf).unwrap(), 0);
    }
}
