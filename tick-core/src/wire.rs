//! Текстовые записи, которые сервер пишет в соединение.
//!
//! Никакого фрейминга кроме перевода строки: клиент просто копирует байты.

/// Префикс строки со временем
pub const TICK_PREFIX: &str = "now: ";

/// Префикс строки с сообщением оператора
pub const MESSAGE_PREFIX: &str = "MESSAGE: ";

/// `now: <ts>\n`
pub fn format_tick_line(timestamp: &str) -> String {
    format!("{TICK_PREFIX}{timestamp}\n")
}

/// `MESSAGE: <text>`. Перевод строки из ввода оператора сохраняется как есть;
/// если его нет, добавляем свой, чтобы каждая запись заканчивалась `\n`.
pub fn format_message_line(text: &str) -> String {
    let mut line = String::with_capacity(MESSAGE_PREFIX.len() + text.len() + 1);
    line.push_str(MESSAGE_PREFIX);
    line.push_str(text);
    if !text.ends_with('\n') {
        line.push('\n');
    }
    line
}
