use std::sync::Arc;

use tokio::time::Duration;
use tracing::info;

use crate::collector::{
    EndpointRegistry, EventPublisher, EventSourceRegistry, PollContext, Scheduler,
};
use crate::mib::DmHistoryShape;
use crate::models::HistoryStatsInput;
use crate::query::{PendingQuery, QueryService};
use crate::snmp::{Credential, SnmpTransport};
use crate::table::TableWalker;

/// Из чего собирается провайдер.
pub struct ProviderParts {
    pub session: Arc<dyn SnmpTransport>,
    pub walker: TableWalker,
    pub shape: DmHistoryShape,
    pub publisher: Arc<dyn EventPublisher>,
    pub sources: Arc<dyn EventSourceRegistry>,
    pub period: Duration,
    pub max_concurrent_queries: usize,
}

/// Провайдер истории MEF SOAM: периодический сбор и запросы по требованию через одну сессию.
pub struct SoamProvider {
    session: Arc<dyn SnmpTransport>,
    registry: Arc<EndpointRegistry>,
    scheduler: Scheduler,
    queries: QueryService,
}

impl SoamProvider {
    pub fn new(parts: ProviderParts) -> Self {
        let shape = Arc::new(parts.shape);
        let context = Arc::new(PollContext {
            session: parts.session.clone(),
            walker: parts.walker.clone(),
            shape: shape.clone(),
            publisher: parts.publisher,
        });
        let registry = Arc::new(EndpointRegistry::new(parts.sources, context));
        let scheduler = Scheduler::new(registry.clone(), parts.period);
        let queries = QueryService::new(
            parts.session.clone(),
            parts.walker,
            shape,
            parts.max_concurrent_queries,
        );

        Self {
            session: parts.session,
            registry,
            scheduler,
            queries,
        }
    }

    /// Запускает периодический сбор. Повторный вызов во время работы ничего не делает.
    pub fn init(&self) {
        if self.scheduler.start() {
            info!(
                nodes = self.registry.len(),
                period_secs = self.scheduler.period().as_secs(),
                "SOAM provider started"
            );
        }
    }

    /// Останавливает сбор, освобождает все эндпоинты и закрывает сессию.
    pub async fn close(&self) {
        self.scheduler.stop().await;
        self.queries.close();
        self.registry.clear();
        self.session.close().await;
        info!("SOAM provider closed");
    }

    pub fn add_node(
        &self,
        id: &str,
        address: &str,
        community: &str,
        poll_interval: Duration,
    ) {
        self.registry
            .add(id, Credential::new(address, community), poll_interval);
    }

    /// Возвращает, был ли зарегистрирован узел с таким id.
    pub fn remove_node(&self, id: &str) -> bool {
        self.registry.remove(id)
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.registry.ids()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Запускает разовый обход. Возвращённая future завершается один раз с результатом.
    pub fn get_history_stats(&self, input: &HistoryStatsInput) -> PendingQuery {
        self.queries
            .query(Credential::new(&input.ip_address, &input.community))
    }

    /// Сразу выполняет один тик сбора.
    pub async fn poll_now(&self) {
        self.scheduler.run_tick().await;
    }
}

