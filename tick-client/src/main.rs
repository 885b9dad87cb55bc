//! Точка входа `tick-client`.
//!
//! Жизненный цикл:
//! - парсинг CLI и резолвинг хоста (с fallback на 127.0.0.1)
//! - одна попытка подключения с таймаутом; неудача фатальна
//! - копирование входящего потока в stdout до EOF или `Ctrl+C`

mod cli;
mod config;
mod error;
mod stream;
mod target;
mod tcp;

use std::io;
use std::net::Shutdown;

use anyhow::Context;
use clap::Parser;
use log::info;
use tick_core::CancelToken;

use crate::config::ClientConfig;

fn main() -> anyhow::Result<()> {
    // Логи в stderr, stdout занят потоком от сервера
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cancel = CancelToken::new();

    // Ctrl+C => отмена
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.cancel();
            info!("shutting down...");
        })?;
    }

    let args = cli::Args::parse();
    let cfg = ClientConfig::from_args(&args)?;

    let target = target::resolve_target(cfg.host.as_deref(), cfg.port)?;
    info!("connecting to {target}");

    let conn = tcp::dial(&target, cfg.connect_timeout, cfg.keepalive, &cancel)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = stream::copy_until_cancelled(&conn, &mut out, &cancel)
        .with_context(|| format!("stream from {target} failed"))?;

    conn.shutdown(Shutdown::Both).ok();
    info!("{}: {} bytes received", report.end, report.bytes);

    Ok(())
}
