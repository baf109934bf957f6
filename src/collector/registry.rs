use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Duration;
use tracing::info;

use super::endpoint::{MonitoredEndpoint, PollContext};
use super::events::{EventSourceRegistration, EventSourceRegistry};
use crate::snmp::Credential;

struct Entry {
    endpoint: Arc<MonitoredEndpoint>,
    registration: Box<dyn EventSourceRegistration>,
}

/// Активные эндпоинты по id. Тик обходит [`snapshot`](Self::snapshot), а не саму карту.
pub struct EndpointRegistry {
    entries: Mutex<BTreeMap<String, Entry>>,
    sources: Arc<dyn EventSourceRegistry>,
    context: Arc<PollContext>,
}

impl EndpointRegistry {
    pub fn new(sources: Arc<dyn EventSourceRegistry>, context: Arc<PollContext>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            sources,
            context,
        }
    }

    /// Регистрирует эндпоинт, заменяя (и сначала освобождая) запись с тем же id.
    pub fn add(&self, id: &str, credential: Credential, poll_interval: Duration) {
        let endpoint = Arc::new(MonitoredEndpoint::new(
            id,
            credential,
            poll_interval,
            self.context.clone(),
        ));

        let previous = self.entries.lock().remove(id);
        if let Some(previous) = previous {
            previous.registration.close();
            info!(node = id, "replacing monitored endpoint");
        }

        let registration = self.sources.register_event_source(&endpoint.source_info());
        info!(
            node = id,
            agent = endpoint.credential().address(),
            interval_secs = poll_interval.as_secs(),
            "monitored endpoint added"
        );

        // Параллельный add с тем же id мог успеть раньше
        let raced = self.entries.lock().insert(
            id.to_string(),
            Entry {
                endpoint,
                registration,
            },
        );
        if let Some(raced) = raced {
            raced.registration.close();
        }
    }

    /// Удаляет эндпоинт и освобождает его регистрацию. Неизвестные id игнорируются.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.entries.lock().remove(id);
        match removed {
            Some(entry) => {
                entry.registration.close();
                info!(node = id, "monitored endpoint removed");
                true
            }
            None => false,
        }
    }

    /// Копия текущих эндпоинтов, упорядоченная по id.
    pub fn snapshot(&self) -> Vec<Arc<MonitoredEndpoint>> {
        self.entries
            .lock()
            .values()
            .map(|entry| entry.endpoint.clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Удаляет все эндпоинты, освобождая каждую регистрацию ровно один раз.
    pub fn clear(&self) {
        let entries = std::mem::take(&mut *self.entries.lock());
        for (_, entry) in entries {
            entry.registration.close();
        }
    }
}
