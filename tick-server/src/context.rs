use std::sync::Arc;
use std::time::Duration;

use tick_core::{CancelToken, Clock};

use crate::delivery::Delivery;
use crate::tracker::ConnTracker;

/// Всё, что нужно accept-циклу и сессиям. Создаётся один раз в `main`
/// и клонируется в каждый поток.
#[derive(Clone)]
pub(crate) struct ServerContext {
    pub(crate) delivery: Delivery,
    pub(crate) tracker: Arc<ConnTracker>,
    pub(crate) cancel: CancelToken,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) tick_interval: Duration,
    pub(crate) write_timeout: Duration,
    pub(crate) keepalive: Duration,
}
