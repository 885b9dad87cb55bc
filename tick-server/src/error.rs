use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Фатальные ошибки сервера: после них процесс завершается
#[derive(Debug, Error)]
pub(crate) enum ServerError {
    #[error("failed to bind TCP listener on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to configure TCP listener")]
    Listener(#[source] io::Error),

    #[error("failed to install interrupt handler")]
    InterruptHandler(#[from] ctrlc::Error),

    #[error("accept thread panicked")]
    AcceptPanicked,
}
