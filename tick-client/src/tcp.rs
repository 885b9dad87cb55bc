use std::io;
use std::net::TcpStream;
use std::time::Duration;

use log::{debug, warn};
use tick_core::{CancelToken, POLL_INTERVAL};

use crate::error::ClientError;
use crate::target::Target;

/// Одна попытка подключения на каждый адрес цели, каждая не дольше
/// `connect_timeout`. Без повторов и backoff.
///
/// У готового сокета включён keep-alive и короткий read timeout: чтение
/// периодически просыпается, чтобы заметить Ctrl+C.
pub(crate) fn dial(
    target: &Target,
    connect_timeout: Duration,
    keepalive: Duration,
    cancel: &CancelToken,
) -> Result<TcpStream, ClientError> {
    let mut last_err = None;

    for addr in &target.addrs {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled {
                target: target.label.clone(),
            });
        }

        match TcpStream::connect_timeout(addr, connect_timeout) {
            Ok(stream) => {
                if let Err(e) = tick_core::net::enable_keepalive(&stream, keepalive) {
                    warn!("failed to enable keep-alive: {e}");
                }
                stream.set_read_timeout(Some(POLL_INTERVAL)).ok();
                debug!("connected to {addr}");
                return Ok(stream);
            }
            Err(e) => {
                debug!("connect to {addr} failed: {e}");
                last_err = Some(e);
            }
        }
    }

    Err(ClientError::Connect {
        target: target.label.clone(),
        source: last_err
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses to dial")),
    })
}
