use clap::Parser;
use std::net::SocketAddr;

use crate::config;
use crate::delivery::DeliveryPolicy;

/// Tick Server - раз в интервал пишет всем клиентам текущее время,
/// вперемешку с сообщениями, которые оператор вводит в stdin.
#[derive(Parser, Debug, Clone)]
#[command(name = "tick-server", version, about)]
pub(crate) struct Args {
    /// TCP bind address, например 0.0.0.0:9000
    #[arg(long, default_value = config::TCP_BIND_ADDR)]
    pub(crate) bind: SocketAddr,

    /// Интервал тика в миллисекундах
    #[arg(long, default_value_t = tick_core::TICK_INTERVAL.as_millis() as u64)]
    pub(crate) tick_interval_ms: u64,

    /// Кто получает сообщение оператора:
    /// - lottery: одно соединение, чей тик успел первым
    /// - broadcast: все подключённые соединения
    #[arg(long, value_enum, default_value_t = DeliveryPolicy::Lottery)]
    pub(crate) delivery: DeliveryPolicy,

    /// Размер личной очереди соединения (только для broadcast)
    #[arg(long, default_value_t = config::OUTBOX_CAPACITY)]
    pub(crate) outbox_capacity: usize,

    /// Ограничить ожидание соединений при остановке (мс). После дедлайна
    /// оставшиеся соединения закрываются принудительно. По умолчанию ждём всех.
    #[arg(long)]
    pub(crate) drain_timeout_ms: Option<u64>,

    /// Keep-alive для принятых соединений, в секундах
    #[arg(long, default_value_t = tick_core::KEEPALIVE_INTERVAL.as_secs())]
    pub(crate) keepalive_secs: u64,

    /// Таймаут записи в сокет (мс), чтобы зависший клиент не держал остановку
    #[arg(long, default_value_t = config::WRITE_TIMEOUT.as_millis() as u64)]
    pub(crate) write_timeout_ms: u64,

    /// Не печатать приглашение "Enter a message: "
    #[arg(long)]
    pub(crate) no_prompt: bool,
}
