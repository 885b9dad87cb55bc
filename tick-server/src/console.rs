use std::io::{self, BufRead, Write};

use log::{debug, info, warn};
use tick_core::{CancelToken, Mailbox};

pub(crate) const PROMPT: &str = "Enter a message: ";

/// Цикл ввода оператора: приглашение -> строка из stdin -> в ящик -> следующая.
///
/// Строка кладётся как есть, вместе с `\n`. Пока предыдущее сообщение никто
/// не забрал, цикл стоит на `enqueue`. Выход по EOF, ошибке чтения или отмене.
/// Заблокированное чтение stdin отменой не прерывается.
pub(crate) fn run_operator_input<R: BufRead, W: Write>(
    mut input: R,
    mut prompt: Option<W>,
    mailbox: &Mailbox,
    cancel: &CancelToken,
) -> io::Result<u64> {
    let mut queued = 0;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if let Some(out) = prompt.as_mut() {
            out.write_all(PROMPT.as_bytes())?;
            out.flush()?;
        }

        // не-UTF-8 байты не должны ронять цикл ввода
        let mut buf = Vec::new();
        if input.read_until(b'\n', &mut buf)? == 0 {
            info!("operator input closed");
            break;
        }
        let line = match String::from_utf8(buf) {
            Ok(s) => s,
            Err(e) => {
                warn!("operator input is not valid UTF-8, replacing invalid bytes");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        match mailbox.enqueue_cancellable(line, cancel) {
            Ok(()) => {
                queued += 1;
                debug!("operator message queued");
            }
            Err(e) => {
                debug!("operator message not queued: {:?}", e.into_message());
                break;
            }
        }
    }

    Ok(queued)
}
