use clap::Parser;

/// Tick Client - подключается к tick-server и копирует всё, что тот шлёт, в stdout.
#[derive(Parser, Debug, Clone)]
#[command(name = "tick-client", version, about)]
pub(crate) struct Args {
    /// Хост сервера. Без аргумента пробуем "server" (имя сервиса в
    /// docker-compose), а если оно не резолвится - 127.0.0.1
    pub(crate) host: Option<String>,

    /// TCP порт сервера
    #[arg(long, default_value_t = tick_core::DEFAULT_PORT)]
    pub(crate) port: u16,

    /// Таймаут установки соединения, мс
    #[arg(long, default_value_t = tick_core::CONNECT_TIMEOUT.as_millis() as u64)]
    pub(crate) connect_timeout_ms: u64,

    /// Keep-alive для соединения, в секундах
    #[arg(long, default_value_t = tick_core::KEEPALIVE_INTERVAL.as_secs())]
    pub(crate) keepalive_secs: u64,
}
