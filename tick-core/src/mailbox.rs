use std::time::Duration;

use crossbeam_channel::{Receiver, SendTimeoutError, Sender};

use crate::cancel::CancelToken;
use crate::constants::POLL_INTERVAL;
use crate::error::EnqueueError;

/// Почтовый ящик оператора: FIFO на одно сообщение.
///
/// Пока лежит непрочитанное сообщение, следующий `enqueue` ждёт
/// (backpressure, а не перезапись). Клоны делят один и тот же слот,
/// поэтому ящик можно раздать всем соединениям: кто первым заберёт,
/// тот и получит сообщение.
#[derive(Debug, Clone)]
pub struct Mailbox {
    tx: Sender<String>,
    rx: Receiver<String>,
}

impl Mailbox {
    /// Ёмкость слота
    pub const CAPACITY: usize = 1;

    /// Пустой ящик
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(Self::CAPACITY);
        Self { tx, rx }
    }

    /// Положить сообщение, дождавшись свободного слота
    pub fn enqueue(&self, text: String) {
        // ящик сам держит receiver, поэтому канал не может быть закрыт
        if self.tx.send(text).is_err() {
            unreachable!("mailbox owns its receiver");
        }
    }

    /// То же, что [`Mailbox::enqueue`], но ожидание прерывается отменой.
    /// Сообщение тогда возвращается внутри ошибки.
    pub fn enqueue_cancellable(&self, text: String, cancel: &CancelToken) -> Result<(), EnqueueError> {
        let mut text = text;
        loop {
            if cancel.is_cancelled() {
                return Err(EnqueueError::Cancelled(text));
            }

            match self.tx.send_timeout(text, POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(back)) => text = back,
                Err(SendTimeoutError::Disconnected(_)) => unreachable!("mailbox owns its receiver"),
            }
        }
    }

    /// Неблокирующее чтение: `None`, если слот пуст
    pub fn try_dequeue(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Подождать сообщение не дольше `timeout`
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<String> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Пуст ли слот
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn try_dequeue_on_empty_returns_none_without_blocking() {
        let mb = Mailbox::new();
        assert!(mb.is_empty());
        assert_eq!(mb.try_dequeue(), None);
    }

    #[test]
    fn enqueue_then_dequeue_returns_same_text() {
        let mb = Mailbox::new();
        mb.enqueue("hello\n".to_string());
        assert!(!mb.is_empty());
        assert_eq!(mb.try_dequeue().as_deref(), Some("hello\n"));
        assert_eq!(mb.try_dequeue(), None);
    }

    #[test]
    fn second_enqueue_blocks_until_slot_is_consumed() {
        let mb = Mailbox::new();
        mb.enqueue("first".to_string());

        let done = Arc::new(AtomicBool::new(false));
        let producer = {
            let mb = mb.clone();
            let done = done.clone();
            thread::spawn(move || {
                mb.enqueue("second".to_string());
                done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!done.load(Ordering::SeqCst), "capacity must be exactly one");

        assert_eq!(mb.try_dequeue().as_deref(), Some("first"));
        producer.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(mb.try_dequeue().as_deref(), Some("second"));
    }

    #[test]
    fn clones_share_one_slot_and_only_one_consumer_wins() {
        let a = Mailbox::new();
        let b = a.clone();

        a.enqueue("only once".to_string());

        let got: Vec<_> = [b.try_dequeue(), a.try_dequeue()]
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(got, vec!["only once".to_string()]);
    }

    #[test]
    fn enqueue_cancellable_gives_message_back_on_cancel() {
        let mb = Mailbox::new();
        mb.enqueue("occupied".to_string());

        let cancel = CancelToken::new();
        let h = {
            let mb = mb.clone();
            let cancel = cancel.clone();
            thread::spawn(move || mb.enqueue_cancellable("late".to_string(), &cancel))
        };

        thread::sleep(Duration::from_millis(50));
        cancel.cancel();

        let err = h.join().unwrap().unwrap_err();
        assert_eq!(err.into_message(), "late");
        // слот не тронут
        assert_eq!(mb.try_dequeue().as_deref(), Some("occupied"));
    }

    #[test]
    fn dequeue_timeout_returns_none_when_nothing_arrives() {
        let mb = Mailbox::new();
        assert_eq!(mb.dequeue_timeout(Duration::from_millis(20)), None);

        mb.enqueue("x".to_string());
        assert_eq!(mb.dequeue_timeout(Duration::from_millis(20)).as_deref(), Some("x"));
    }
}
