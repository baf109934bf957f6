use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::PublishError;
use crate::mib::DmHistoryEntry;

/// Исходящее уведомление об одном завершённом опросе эндпоинта.
#[derive(Debug, Clone, Serialize)]
pub struct SoamEvent {
    pub node_id: String,
    pub address: String,
    pub table: &'static str,
    pub collected_at: DateTime<Utc>,
    /// Часть строк отброшена как неполные или битые.
    pub partial: bool,
    pub records: Vec<DmHistoryEntry>,
}

/// Канал, в который уходят собранные события.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: SoamEvent) -> Result<(), PublishError>;
}

/// Рассылает события всем текущим подписчикам.
pub struct BroadcastPublisher {
    tx: broadcast::Sender<SoamEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SoamEvent> {
        self.tx.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: SoamEvent) -> Result<(), PublishError> {
        self.tx
            .send(event)
            .map(|receivers| debug!(receivers, "event published"))
            .map_err(|_| PublishError::NoSubscribers)
    }
}

/// Что реестр источников событий знает об эндпоинте.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSourceInfo {
    pub node_id: String,
    pub address: String,
}

/// Хэндл одной регистрации источника событий. `close` поглощает его, поэтому закрытие происходит один раз.
pub trait EventSourceRegistration: Send + Sync {
    fn close(self: Box<Self>);
}

/// Публикует эндпоинты как источники событий, на которые можно подписаться.
#[cfg_attr(test, mockall::automock)]
pub trait EventSourceRegistry: Send + Sync {
    fn register_event_source(&self, source: &EventSourceInfo) -> Box<dyn EventSourceRegistration>;
}

/// Локальный реестр, который только помнит, какие источники живы.
#[derive(Default, Clone)]
pub struct LocalEventSources {
    live: Arc<Mutex<BTreeSet<String>>>,
}

impl LocalEventSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> Vec<String> {
        self.live.lock().iter().cloned().collect()
    }
}

impl EventSourceRegistry for LocalEventSources {
    fn register_event_source(&self, source: &EventSourceInfo) -> Box<dyn EventSourceRegistration> {
        self.live.lock().insert(source.node_id.clone());
        info!(node = %source.node_id, address = %source.address, "event source registered");
        Box::new(LocalRegistration {
            node_id: source.node_id.clone(),
            live: self.live.clone(),
        })
    }
}

struct LocalRegistration {
    node_id: String,
    live: Arc<Mutex<BTreeSet<String>>>,
}

impl EventSourceRegistration for LocalRegistration {
    fn close(self: Box<Self>) {
        self.live.lock().remove(&self.node_id);
        info!(node = %self.node_id, "event source released");
    }
}
