use std::time::Duration;

/// TCP порт сервера по умолчанию
pub const DEFAULT_PORT: u16 = 9000;

/// Интервал тика (запись текущего времени в соединение)
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Таймаут установки соединения у клиента
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Через сколько простоя ядро начинает слать keep-alive пробы
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// Имя хоста сервера внутри docker-compose сети
pub const DEFAULT_HOST: &str = "server";

/// Куда идём, если [`DEFAULT_HOST`] не резолвится
pub const FALLBACK_HOST: &str = "127.0.0.1";

/// Шаг опроса для циклов, которые ждут I/O и проверяют отмену
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);
