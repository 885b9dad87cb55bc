use std::time::Duration;

use tick_core::ConfigError;

use crate::cli::Args;

/// Проверенная конфигурация клиента
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClientConfig {
    /// `None` = хост по умолчанию с fallback
    pub(crate) host: Option<String>,
    pub(crate) port: u16,
    pub(crate) connect_timeout: Duration,
    pub(crate) keepalive: Duration,
}

impl ClientConfig {
    pub(crate) fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let host = match &args.host {
            Some(h) if h.trim().is_empty() => return Err(ConfigError::EmptyHost),
            Some(h) => Some(h.trim().to_string()),
            None => None,
        };

        Ok(Self {
            host,
            port: args.port,
            connect_timeout: ConfigError::check_duration(
                "--connect-timeout-ms",
                Duration::from_millis(args.connect_timeout_ms),
            )?,
            keepalive: ConfigError::check_duration(
                "--keepalive-secs",
                Duration::from_secs(args.keepalive_secs),
            )?,
        })
    }
}
