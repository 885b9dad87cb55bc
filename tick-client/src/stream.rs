use std::fmt;
use std::io::{self, Read, Write};

use tick_core::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CopyEnd {
    /// сервер закрыл соединение - нормальное завершение
    Eof,
    Cancelled,
}

impl fmt::Display for CopyEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyEnd::Eof => f.write_str("connection closed by server"),
            CopyEnd::Cancelled => f.write_str("interrupted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CopyReport {
    pub(crate) bytes: u64,
    pub(crate) end: CopyEnd,
}

/// Побайтовое копирование входящего потока в `out` без разбора.
///
/// Таймауты чтения - это просто "тик" цикла для проверки отмены.
/// Ошибки чтения и записи возвращаются как есть, без повторов.
pub(crate) fn copy_until_cancelled<R: Read, W: Write>(
    mut input: R,
    out: &mut W,
    cancel: &CancelToken,
) -> io::Result<CopyReport> {
    let mut buf = [0u8; 4096];
    let mut bytes: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Ok(CopyReport {
                bytes,
                end: CopyEnd::Cancelled,
            });
        }

        match input.read(&mut buf) {
            Ok(0) => {
                return Ok(CopyReport {
                    bytes,
                    end: CopyEnd::Eof,
                });
            }
            Ok(n) => {
                out.write_all(&buf[..n])?;
                out.flush()?;
                bytes += n as u64;
            }
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                // просто "тик" цикла, ничего не делаем
                continue;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn copies_bytes_verbatim_until_eof() {
        let input = "now: 2024-01-01 00:00:00\nMESSAGE: hello\n\n";
        let mut out: Vec<u8> = Vec::new();

        let report = copy_until_cancelled(Cursor::new(input), &mut out, &CancelToken::new()).unwrap();

        assert_eq!(report.end, CopyEnd::Eof);
        assert_eq!(report.bytes, input.len() as u64);
        assert_eq!(out, input.as_bytes());
    }

    #[test]
    fn stops_without_reading_when_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut out: Vec<u8> = Vec::new();
        let report = copy_until_cancelled(Cursor::new("data"), &mut out, &cancel).unwrap();

        assert_eq!(report.end, CopyEnd::Cancelled);
        assert_eq!(report.bytes, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn read_error_is_returned() {
        struct Reset;

        impl Read for Reset {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))
            }
        }

        let err = copy_until_cancelled(Reset, &mut Vec::<u8>::new(), &CancelToken::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn idle_socket_with_read_timeout_observes_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (_server, _) = listener.accept().unwrap();
        client
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();

        let cancel = CancelToken::new();
        let h = {
            let cancel = cancel.clone();
            thread::spawn(move || copy_until_cancelled(&client, &mut Vec::<u8>::new(), &cancel))
        };

        thread::sleep(Duration::from_millis(100));
        cancel.cancel();

        let report = h.join().unwrap().unwrap();
        assert_eq!(report.end, CopyEnd::Cancelled);
    }

    #[test]
    fn socket_stream_is_mirrored_until_server_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut s, _) = listener.accept().unwrap();
            s.write_all(b"now: a\n").unwrap();
            s.write_all(b"now: b\nMESSAGE: hi\n").unwrap();
        });

        let client = TcpStream::connect(addr).unwrap();
        let mut out: Vec<u8> = Vec::new();
        let report = copy_until_cancelled(&client, &mut out, &CancelToken::new()).unwrap();
        server.join().unwrap();

        assert_eq!(report.end, CopyEnd::Eof);
        assert_eq!(String::from_utf8(out).unwrap(), "now: a\nnow: b\nMESSAGE: hi\n");
    }
}
