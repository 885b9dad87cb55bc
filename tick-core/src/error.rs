use std::time::Duration;
use thiserror::Error;

/// Ошибки валидации конфигурации (общие для сервера и клиента)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Длительность должна быть больше нуля
    #[error("{name} must be greater than zero")]
    ZeroDuration {
        /// имя параметра, как в CLI
        name: &'static str,
    },

    /// Пустое имя хоста
    #[error("host must not be empty")]
    EmptyHost,

    /// Ёмкость очереди должна быть больше нуля
    #[error("{name} must be at least 1")]
    ZeroCapacity {
        /// имя параметра, как в CLI
        name: &'static str,
    },
}

impl ConfigError {
    /// Проверка, что длительность не нулевая
    pub fn check_duration(name: &'static str, value: Duration) -> Result<Duration, ConfigError> {
        if value.is_zero() {
            return Err(ConfigError::ZeroDuration { name });
        }
        Ok(value)
    }
}

/// Ошибка постановки сообщения в почтовый ящик
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    /// Отмена пришла, пока ждали свободный слот. Сообщение возвращается вызывающему.
    #[error("cancelled while waiting for a free slot")]
    Cancelled(String),
}

impl EnqueueError {
    /// Забрать сообщение, которое так и не попало в очередь
    pub fn into_message(self) -> String {
        match self {
            EnqueueError::Cancelled(msg) => msg,
        }
    }
}
