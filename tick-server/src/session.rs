use crate::config::ConnId;
use crate::delivery::MessageSource;
use crossbeam_channel::select;
use log::{debug, warn};
use std::io::{self, Write};
use std::time::Duration;
use tick_core::wire::{format_message_line, format_tick_line};
use tick_core::{CancelToken, Clock};

/// Почему сессия закончилась
#[derive(Debug)]
pub(crate) enum SessionEnd {
    Cancelled,
    /// клиент ушёл или сокет сломался; для остального сервера не фатально
    WriteFailed(io::Error),
}

#[derive(Debug)]
pub(crate) struct SessionReport {
    pub(crate) ticks: u64,
    pub(crate) messages: u64,
    pub(crate) end: SessionEnd,
}

/// Тиковый цикл одного соединения.
///
/// Раз в `interval`: пишем `now: <ts>`, потом без ожидания заглядываем
/// в источник сообщений и, если там что-то есть, пишем `MESSAGE: ...`
/// в то же соединение. Первая же ошибка записи завершает сессию, без повторов.
pub(crate) fn run_session<W: Write>(
    cid: ConnId,
    out: &mut W,
    source: &dyn MessageSource,
    clock: &dyn Clock,
    interval: Duration,
    cancel: &CancelToken,
) -> SessionReport {
    let ticker = crossbeam_channel::tick(interval);
    let mut report = SessionReport {
        ticks: 0,
        messages: 0,
        end: SessionEnd::Cancelled,
    };

    loop {
        if cancel.is_cancelled() {
            break;
        }

        select! {
            recv(cancel.receiver()) -> _ => break,
            recv(ticker) -> _ => {}
        }

        // select выбирает случайно, если готовы оба
        if cancel.is_cancelled() {
            break;
        }

        report.ticks += 1;
        match write_tick(cid, out, source, clock) {
            Ok(delivered) => {
                if delivered {
                    report.messages += 1;
                }
            }
            Err(e) => {
                report.end = SessionEnd::WriteFailed(e);
                break;
            }
        }
    }

    report
}

/// Одна запись на тик. `Ok(true)`, если вместе со временем ушло сообщение.
fn write_tick<W: Write>(
    cid: ConnId,
    out: &mut W,
    source: &dyn MessageSource,
    clock: &dyn Clock,
) -> io::Result<bool> {
    out.write_all(format_tick_line(&clock.now()).as_bytes())?;

    let delivered = match source.try_next() {
        Some(msg) => {
            if let Err(e) = out.write_all(format_message_line(&msg).as_bytes()) {
                warn!("conn {cid}: operator message lost: {:?}", msg.trim_end());
                return Err(e);
            }
            debug!("conn {cid}: delivered operator message");
            true
        }
        None => false,
    };

    out.flush()?;
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Instant;
    use tick_core::Mailbox;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> String {
            "2024-01-01 00:00:00".to_string()
        }
    }

    /// Writer, который отдаёт всё записанное в общий буфер
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Writer, который ломается после `ok_writes` успешных вызовов write
    struct FailingWriter {
        ok_writes: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.ok_writes == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
            }
            self.ok_writes -= 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_tick_writes_time_then_queued_message() {
        let mailbox = Mailbox::new();
        mailbox.enqueue("hello\n".to_string());

        let mut out: Vec<u8> = Vec::new();
        assert!(write_tick(1, &mut out, &mailbox, &FixedClock).unwrap());
        assert!(!write_tick(1, &mut out, &mailbox, &FixedClock).unwrap());

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "now: 2024-01-01 00:00:00\nMESSAGE: hello\nnow: 2024-01-01 00:00:00\n"
        );
    }

    #[test]
    fn run_session_returns_immediately_when_already_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut out: Vec<u8> = Vec::new();
        let report = run_session(
            1,
            &mut out,
            &Mailbox::new(),
            &FixedClock,
            Duration::from_millis(10),
            &cancel,
        );

        assert!(matches!(report.end, SessionEnd::Cancelled));
        assert_eq!(report.ticks, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn run_session_ticks_at_interval_until_cancelled() {
        let cancel = CancelToken::new();
        let mailbox = Mailbox::new();
        let buf = SharedBuf::default();

        let h = {
            let cancel = cancel.clone();
            let mailbox = mailbox.clone();
            let mut out = buf.clone();
            thread::spawn(move || {
                run_session(1, &mut out, &mailbox, &FixedClock, Duration::from_millis(50), &cancel)
            })
        };

        mailbox.enqueue("ping\n".to_string());
        thread::sleep(Duration::from_millis(380));
        cancel.cancel();

        let started = Instant::now();
        let report = h.join().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1), "cancel must stop the loop promptly");

        assert!(matches!(report.end, SessionEnd::Cancelled));
        assert_eq!(report.messages, 1);
        // ~7 тиков за 380мс, но не больше одного за интервал
        assert!(report.ticks >= 3, "too few ticks: {}", report.ticks);
        assert!(report.ticks <= 8, "too many ticks: {}", report.ticks);

        let text = buf.text();
        let ticks = text.lines().filter(|l| l.starts_with("now: ")).count() as u64;
        assert_eq!(ticks, report.ticks);
        assert_eq!(text.matches("MESSAGE: ping\n").count(), 1);
    }

    #[test]
    fn run_session_stops_on_first_write_error() {
        let cancel = CancelToken::new();
        let mut out = FailingWriter { ok_writes: 2 };

        let report = run_session(
            1,
            &mut out,
            &Mailbox::new(),
            &FixedClock,
            Duration::from_millis(5),
            &cancel,
        );

        assert_eq!(report.ticks, 3);
        match report.end {
            SessionEnd::WriteFailed(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected WriteFailed, got {other:?}"),
        }
        assert!(!cancel.is_cancelled(), "write error must not cancel the process");
    }

    #[test]
    fn message_is_consumed_even_when_its_write_fails() {
        let mailbox = Mailbox::new();
        mailbox.enqueue("lost\n".to_string());

        // время запишется, сообщение уже нет
        let mut out = FailingWriter { ok_writes: 1 };
        let err = write_tick(1, &mut out, &mailbox, &FixedClock).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(mailbox.is_empty());
    }
}
