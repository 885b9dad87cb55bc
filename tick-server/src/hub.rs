use crate::config::ConnId;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum HubError {
    #[error("connection already subscribed: {0}")]
    AlreadySubscribed(ConnId),
}

#[derive(Debug)]
pub(crate) struct BroadcastStats {
    sent: usize,
    dropped_full: usize,
    dropped_dead: usize,
}

impl fmt::Display for BroadcastStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent={} dropped_full={} dropped_dead={}",
            self.sent, self.dropped_full, self.dropped_dead
        )
    }
}

impl BroadcastStats {
    pub(crate) fn delivered(&self) -> usize {
        self.sent
    }
}

/// Раздача сообщений оператора всем соединениям (режим broadcast).
///
/// У каждого соединения своя ограниченная очередь: медленный клиент
/// теряет сообщения сам, не тормозя остальных.
pub(crate) struct Hub {
    clients: Mutex<HashMap<ConnId, Sender<Arc<str>>>>,
    capacity_per_client: usize,
}

impl Hub {
    pub(crate) fn new(capacity_per_client: usize) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            capacity_per_client,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnId, Sender<Arc<str>>>> {
        match self.clients.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(), // продолжаем, несмотря на poison
        }
    }

    pub(crate) fn add_client(&self, cid: ConnId) -> Result<Receiver<Arc<str>>, HubError> {
        match self.lock().entry(cid) {
            Entry::Vacant(e) => {
                let (tx, rx) = crossbeam_channel::bounded(self.capacity_per_client);
                e.insert(tx);
                Ok(rx)
            }
            Entry::Occupied(_) => Err(HubError::AlreadySubscribed(cid)),
        }
    }

    pub(crate) fn remove_client(&self, cid: ConnId) -> bool {
        self.lock().remove(&cid).is_some()
    }

    pub(crate) fn client_count(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn broadcast(&self, text: &str) -> BroadcastStats {
        let msg: Arc<str> = Arc::from(text);

        let clients_snapshot: Vec<(ConnId, Sender<Arc<str>>)> = self
            .lock()
            .iter()
            .map(|(&cid, tx)| (cid, tx.clone()))
            .collect();

        let mut sent: usize = 0;
        let mut dropped_full: usize = 0;
        let mut dropped_disconnected: Vec<ConnId> = Vec::new();

        for (cid, tx) in clients_snapshot.iter() {
            match tx.try_send(msg.clone()) {
                Ok(()) => sent += 1,
                Err(TrySendError::Disconnected(_)) => dropped_disconnected.push(*cid),
                Err(TrySendError::Full(_)) => dropped_full += 1,
            }
        }

        for cid in &dropped_disconnected {
            self.remove_client(*cid);
        }

        BroadcastStats {
            sent,
            dropped_full,
            dropped_dead: dropped_disconnected.len(),
        }
    }
}
