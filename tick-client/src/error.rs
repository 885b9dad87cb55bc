use std::io;

use thiserror::Error;

/// Ошибки подключения. Все фатальны: переподключения нет.
#[derive(Debug, Error)]
pub(crate) enum ClientError {
    #[error("failed to resolve {target}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("{target} resolved to no addresses")]
    NoAddress { target: String },

    #[error("failed to connect to {target}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("interrupted before connecting to {target}")]
    Cancelled { target: String },
}
