//! Точка входа `tick-server`.
//!
//! Жизненный цикл:
//! - парсинг CLI, bind listener'а (ошибка bind фатальна)
//! - поток ввода оператора, accept-поток, по потоку на соединение
//! - `Ctrl+C` => перестаём принимать, ждём все сессии, выходим

mod cli;
mod config;
mod console;
mod context;
mod delivery;
mod error;
mod hub;
mod session;
mod shutdown;
mod tcp;
mod tracker;

use std::io;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use tick_core::{CancelToken, Mailbox, SystemClock};

use crate::config::ServerConfig;
use crate::context::ServerContext;
use crate::delivery::{Delivery, DeliveryPolicy};
use crate::hub::Hub;
use crate::shutdown::ShutdownCoordinator;
use crate::tracker::ConnTracker;

fn main() -> anyhow::Result<()> {
    // Логи через RUST_LOG=info/debug, по умолчанию info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    let cfg = ServerConfig::from_args(&args)?;

    let cancel = CancelToken::new();
    shutdown::install_interrupt_handler(&cancel)?;

    let listener = tcp::bind_listener(cfg.bind)?;
    info!(
        "started: listening on {}, tick={:?}, delivery={:?}",
        cfg.bind, cfg.tick_interval, cfg.delivery
    );

    let mailbox = Mailbox::new();

    let (delivery, dispatcher) = match cfg.delivery {
        DeliveryPolicy::Lottery => (Delivery::Lottery(mailbox.clone()), None),
        DeliveryPolicy::Broadcast => {
            let hub = Arc::new(Hub::new(cfg.outbox_capacity));
            let h = {
                let mailbox = mailbox.clone();
                let hub = hub.clone();
                let cancel = cancel.clone();
                thread::Builder::new()
                    .name("dispatcher".into())
                    .spawn(move || delivery::run_dispatcher(&mailbox, &hub, &cancel))
                    .context("spawn dispatcher thread")?
            };
            (Delivery::Broadcast(hub), Some(h))
        }
    };

    // чтение stdin не прерывается отменой, поэтому поток не ждём
    {
        let mailbox = mailbox.clone();
        let cancel = cancel.clone();
        let prompt = cfg.prompt.then(io::stdout);
        thread::Builder::new()
            .name("operator-input".into())
            .spawn(move || {
                if let Err(e) =
                    console::run_operator_input(io::stdin().lock(), prompt, &mailbox, &cancel)
                {
                    warn!("operator input error: {e}");
                }
            })
            .context("spawn operator input thread")?;
    }

    let tracker = Arc::new(ConnTracker::new());
    let ctx = ServerContext {
        delivery,
        tracker: tracker.clone(),
        cancel: cancel.clone(),
        clock: Arc::new(SystemClock),
        tick_interval: cfg.tick_interval,
        write_timeout: cfg.write_timeout,
        keepalive: cfg.keepalive,
    };

    let accept = thread::Builder::new()
        .name("accept".into())
        .spawn(move || tcp::run_tcp_listener(listener, ctx))
        .context("spawn accept thread")?;

    let coordinator = ShutdownCoordinator::new(cancel, tracker, cfg.drain_timeout);
    let report = coordinator.run(accept)?;

    if let Some(h) = dispatcher {
        if h.join().is_err() {
            warn!("dispatcher thread panicked");
        }
    }

    info!(
        "exit: drained {} connection(s), force-closed {} ({:?})",
        report.drained,
        report.forced,
        coordinator.phase()
    );
    Ok(())
}
