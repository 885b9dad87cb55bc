use chrono::Local;

/// Формат метки времени в строке `now: ...`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f %:z";

/// Источник текущего времени для тиков. Отдельный трейт, чтобы в тестах
/// подставлять фиксированное время.
pub trait Clock: Send + Sync {
    /// Текущее время в человекочитаемом виде
    fn now(&self) -> String;
}

/// Локальные системные часы
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}
