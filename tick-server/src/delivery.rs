use std::sync::Arc;

use clap::ValueEnum;
use crossbeam_channel::Receiver;
use log::{debug, info, warn};
use tick_core::{CancelToken, Mailbox, POLL_INTERVAL};

use crate::config::ConnId;
use crate::hub::{Hub, HubError};

/// Политика доставки сообщений оператора
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DeliveryPolicy {
    /// Общий ящик на всех: сообщение забирает тот, чей тик случился первым.
    /// Остальные клиенты его не увидят.
    Lottery,
    /// Каждое сообщение получает каждое подключённое соединение
    Broadcast,
}

/// Откуда сессия берёт сообщение на очередном тике.
/// `try_next` никогда не блокирует.
pub(crate) trait MessageSource: Send {
    fn try_next(&self) -> Option<String>;
}

impl MessageSource for Mailbox {
    fn try_next(&self) -> Option<String> {
        self.try_dequeue()
    }
}

/// Личная очередь соединения в режиме broadcast
pub(crate) struct Outbox {
    rx: Receiver<Arc<str>>,
}

impl MessageSource for Outbox {
    fn try_next(&self) -> Option<String> {
        self.rx.try_recv().ok().map(|m| m.to_string())
    }
}

/// Выбранная политика вместе с её состоянием
#[derive(Clone)]
pub(crate) enum Delivery {
    Lottery(Mailbox),
    Broadcast(Arc<Hub>),
}

impl Delivery {
    /// Источник сообщений для нового соединения
    pub(crate) fn open(&self, cid: ConnId) -> Result<Box<dyn MessageSource>, HubError> {
        match self {
            Delivery::Lottery(mailbox) => Ok(Box::new(mailbox.clone())),
            Delivery::Broadcast(hub) => {
                let rx = hub.add_client(cid)?;
                Ok(Box::new(Outbox { rx }))
            }
        }
    }

    pub(crate) fn close(&self, cid: ConnId) {
        if let Delivery::Broadcast(hub) = self {
            hub.remove_client(cid);
        }
    }
}

/// Поток-раздатчик для режима broadcast: забирает сообщение из ящика
/// оператора и кладёт копию в очередь каждого соединения.
///
/// Пока нет ни одного клиента, ящик не трогаем: оператор остаётся
/// заблокирован, как и в режиме lottery.
pub(crate) fn run_dispatcher(mailbox: &Mailbox, hub: &Hub, cancel: &CancelToken) {
    while !cancel.is_cancelled() {
        if hub.client_count() == 0 {
            cancel.wait_timeout(POLL_INTERVAL);
            continue;
        }

        let Some(msg) = mailbox.dequeue_timeout(POLL_INTERVAL) else {
            continue;
        };

        let stats = hub.broadcast(&msg);
        if stats.delivered() == 0 {
            warn!("operator message dropped, nobody took it: {stats}");
        } else {
            debug!("operator message fanned out: {stats}");
        }
    }

    info!("dispatcher stopped");
}
