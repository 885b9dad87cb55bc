use std::net::SocketAddr;
use std::time::Duration;

use tick_core::ConfigError;

use crate::cli::Args;
use crate::delivery::DeliveryPolicy;

pub(crate) const TCP_BIND_ADDR: &str = "0.0.0.0:9000";

/// как часто accept-цикл проверяет отмену, пока новых соединений нет
pub(crate) const ACCEPT_POLL: Duration = Duration::from_millis(50);

pub(crate) const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// размер личной очереди соединения в режиме broadcast
pub(crate) const OUTBOX_CAPACITY: usize = 16;

pub(crate) type ConnId = u64;

/// Проверенная конфигурация сервера
#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) bind: SocketAddr,
    pub(crate) tick_interval: Duration,
    pub(crate) delivery: DeliveryPolicy,
    pub(crate) outbox_capacity: usize,
    /// `None` = ждать все соединения без ограничения
    pub(crate) drain_timeout: Option<Duration>,
    pub(crate) keepalive: Duration,
    pub(crate) write_timeout: Duration,
    pub(crate) prompt: bool,
}

impl ServerConfig {
    pub(crate) fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let tick_interval = ConfigError::check_duration(
            "--tick-interval-ms",
            Duration::from_millis(args.tick_interval_ms),
        )?;
        let keepalive =
            ConfigError::check_duration("--keepalive-secs", Duration::from_secs(args.keepalive_secs))?;
        let write_timeout = ConfigError::check_duration(
            "--write-timeout-ms",
            Duration::from_millis(args.write_timeout_ms),
        )?;
        let drain_timeout = args
            .drain_timeout_ms
            .map(|ms| ConfigError::check_duration("--drain-timeout-ms", Duration::from_millis(ms)))
            .transpose()?;

        if args.outbox_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                name: "--outbox-capacity",
            });
        }

        Ok(Self {
            bind: args.bind,
            tick_interval,
            delivery: args.delivery,
            outbox_capacity: args.outbox_capacity,
            drain_timeout,
            keepalive,
            write_timeout,
            prompt: !args.no_prompt,
        })
    }
}
