use std::sync::Arc;

use chrono::Utc;
use tokio::time::Duration;
use tracing::{debug, warn};

use super::events::{EventPublisher, EventSourceInfo, SoamEvent};
use crate::mib::DmHistoryShape;
use crate::snmp::{Credential, SnmpTransport};
use crate::table::TableWalker;

/// Всё, что нужно эндпоинту для опроса. Общее для всех эндпоинтов.
pub struct PollContext {
    pub session: Arc<dyn SnmpTransport>,
    pub walker: TableWalker,
    pub shape: Arc<DmHistoryShape>,
    pub publisher: Arc<dyn EventPublisher>,
}

/// Удалённый агент, опрашиваемый на каждом тике планировщика.
pub struct MonitoredEndpoint {
    id: String,
    credential: Credential,
    poll_interval: Duration,
    context: Arc<PollContext>,
}

impl MonitoredEndpoint {
    pub fn new(
        id: impl Into<String>,
        credential: Credential,
        poll_interval: Duration,
        context: Arc<PollContext>,
    ) -> Self {
        Self {
            id: id.into(),
            credential,
            poll_interval,
            context,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn source_info(&self) -> EventSourceInfo {
        EventSourceInfo {
            node_id: self.id.clone(),
            address: self.credential.address().to_string(),
        }
    }

    /// Обходит таблицу истории и публикует записи. Ошибки только логируются.
    pub async fn poll(&self) {
        let ctx = &self.context;
        let result = match ctx
            .walker
            .walk(ctx.session.as_ref(), &self.credential, ctx.shape.as_ref())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    node = %self.id,
                    agent = self.credential.address(),
                    category = %e.category(),
                    "poll failed: {}",
                    e.message()
                );
                return;
            }
        };

        debug!(node = %self.id, rows = result.len(), "poll completed");

        let event = SoamEvent {
            node_id: self.id.clone(),
            address: self.credential.address().to_string(),
            table: result.table(),
            collected_at: Utc::now(),
            partial: result.is_partial(),
            records: result.into_records(),
        };

        if let Err(e) = ctx.publisher.publish(event) {
            warn!(node = %self.id, "event not delivered: {}", e);
        }
    }
}
