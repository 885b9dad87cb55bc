//! # tick-core
//!
//! Общие кирпичики для tick-server / tick-client.
//!
//! Этот крейт содержит:
//!
//! - [`mailbox`] — почтовый ящик оператора на одно сообщение
//! - [`cancel`] — сигнал отмены, который видят все потоки процесса
//! - [`clock`] — источник метки времени для тиков
//! - [`wire`] — форматирование строк `now: ...` / `MESSAGE: ...`
//! - [`net`] — настройка TCP сокетов (keep-alive)
//! - [`error`] — типы ошибок `tick-core`
//!
//! ## Пример: почтовый ящик
//!
//! ```rust
//! use tick_core::Mailbox;
//!
//! let mb = Mailbox::new();
//! assert_eq!(mb.try_dequeue(), None);
//!
//! mb.enqueue("hello\n".to_string());
//! assert_eq!(mb.try_dequeue().as_deref(), Some("hello\n"));
//! ```
//!
//! ## Пример: строки протокола
//!
//! ```rust
//! use tick_core::wire::{format_message_line, format_tick_line};
//!
//! assert_eq!(format_tick_line("2024-01-01 00:00:00"), "now: 2024-01-01 00:00:00\n");
//! assert_eq!(format_message_line("hello\n"), "MESSAGE: hello\n");
//! ```
//!
//! ## Пример: отмена
//!
//! ```rust
//! use std::time::Duration;
//! use tick_core::CancelToken;
//!
//! let cancel = CancelToken::new();
//! let observer = cancel.clone();
//! cancel.cancel();
//! assert!(observer.is_cancelled());
//! assert!(observer.wait_timeout(Duration::from_millis(1)));
//! ```
//!
//! ## Дизайн
//!
//! Никаких глобальных переменных: ящик и токен отмены создаются в `main`
//! и явно раздаются потокам. Рантайм тут не нужен, только std-потоки
//! и crossbeam-каналы.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Сигнал отмены (Ctrl+C) для всех потоков.
pub mod cancel;

/// Метка времени для тиков.
pub mod clock;

/// Почтовый ящик оператора.
pub mod mailbox;

/// Настройка TCP сокетов.
pub mod net;

/// Формат строк, которые уходят клиенту.
pub mod wire;

/// Ошибки `tick-core`.
pub mod error;

/// Общие константы
mod constants;
pub use constants::{
    CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT, FALLBACK_HOST, KEEPALIVE_INTERVAL, POLL_INTERVAL,
    TICK_INTERVAL,
};

// --- Re-exports (публичный фасад API) ---

pub use crate::cancel::CancelToken;
pub use crate::clock::{Clock, SystemClock};
pub use crate::error::{ConfigError, EnqueueError};
pub use crate::mailbox::Mailbox;
