//! Запросы истории по требованию.
//!
//! Запрос сразу возвращает [`PendingQuery`] и обходит таблицу в отдельной задаче.
//! Результат приходит ровно один раз, что бы ни случилось с воркером.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::{Semaphore, oneshot};
use tokio::time::timeout;
use tracing::{debug, error};

use crate::error::{QueryFault, WalkError, panic_message};
use crate::formatter::render_record_list;
use crate::mib::DmHistoryShape;
use crate::snmp::{Credential, SnmpTransport};
use crate::table::TableWalker;

pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Успешный результат `GetHistoryStats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    /// Весь список записей в виде `[entry, entry, ...]`.
    pub results: String,
    pub row_count: usize,
    pub partial: bool,
}

type Outcome = Result<HistoryStats, QueryFault>;

pub struct QueryService {
    session: Arc<dyn SnmpTransport>,
    walker: TableWalker,
    shape: Arc<DmHistoryShape>,
    permits: Arc<Semaphore>,
}

impl QueryService {
    pub fn new(
        session: Arc<dyn SnmpTransport>,
        walker: TableWalker,
        shape: Arc<DmHistoryShape>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            session,
            walker,
            shape,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Запускает обход таблицы истории на `credential`. Вызывать внутри tokio runtime.
    pub fn query(&self, credential: Credential) -> PendingQuery {
        let (tx, rx) = oneshot::channel();
        let session = self.session.clone();
        let walker = self.walker.clone();
        let shape = self.shape.clone();
        let permits = self.permits.clone();

        tokio::spawn(async move {
            let agent = credential.address().to_string();
            let work = run_query(session, walker, shape, permits, credential);
            let outcome = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(agent = %agent, "query worker panicked: {}", message);
                    Err(QueryFault::internal(format!("query worker panicked: {}", message)))
                }
            };
            if tx.send(outcome).is_err() {
                debug!(agent = %agent, "query caller went away before the result");
            }
        });

        PendingQuery { rx }
    }

    /// Отклоняет новые запросы. Обходы, уже получившие permit, завершаются как обычно.
    pub fn close(&self) {
        self.permits.close();
    }
}

async fn run_query(
    session: Arc<dyn SnmpTransport>,
    walker: TableWalker,
    shape: Arc<DmHistoryShape>,
    permits: Arc<Semaphore>,
    credential: Credential,
) -> Outcome {
    // Ожидание permit тратит тот же лимит времени, что и сам обход
    let budget = walker.settings().walk_timeout;
    let bounded = async {
        let _permit = permits
            .acquire_owned()
            .await
            .map_err(|_| QueryFault::internal("query service is closed"))?;
        walker
            .walk(session.as_ref(), &credential, shape.as_ref())
            .await
            .map_err(QueryFault::from)
    };
    let result = match timeout(budget, bounded).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(WalkError::Transport(format!(
                "query to {} exceeded {:?}",
                credential.address(),
                budget
            ))
            .into());
        }
    };

    Ok(HistoryStats {
        results: render_record_list(result.records()),
        row_count: result.len(),
        partial: result.is_partial(),
    })
}

/// Результат запроса, который ещё выполняется.
pub struct PendingQuery {
    rx: oneshot::Receiver<Outcome>,
}

impl Future for PendingQuery {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(QueryFault::internal("query worker ended without a result"))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultCategory;
    use crate::mib::{dm_history, dm_history_shape};
    use crate::snmp::SnmpValue;
    use crate::snmp::sim::{AgentFault, SimulatedNetwork};
    use pretty_assertions::assert_eq;
    use tokio::time::Duration;

    const AGENT: &str = "192.0.2.10";

    fn service(net: Arc<SimulatedNetwork>) -> QueryService {
        QueryService::new(
            net,
            TableWalker::default(),
            Arc::new(dm_history_shape()),
            DEFAULT_MAX_CONCURRENT,
        )
    }

    fn seed(net: &SimulatedNetwork, history_index: u32, with_two_way_avg: bool) {
        let mut cells = vec![
            (1, SnmpValue::Unsigned32(history_index)),
            (2, SnmpValue::OctetString(vec![0x07, 0xea, 10, 19, 8, 15, 0, 0])),
            (3, SnmpValue::Unsigned32(90_000)),
            (4, SnmpValue::Integer(2)),
            (5, SnmpValue::Unsigned32(100)),
            (6, SnmpValue::Unsigned32(300)),
        ];
        if with_two_way_avg {
            cells.push((7, SnmpValue::Unsigned32(150)));
        }
        net.set_row(
            AGENT,
            &dm_history::default_entry_oid(),
            &[1, 2, 3, 1, history_index],
            cells,
        );
    }

    fn credential() -> Credential {
        Credential::new(AGENT, "public")
    }

    #[tokio::test]
    async fn resolves_with_rendered_records() {
        let net = Arc::new(SimulatedNetwork::new());
        seed(&net, 1, true);
        seed(&net, 2, false);

        let stats = service(net).query(credential()).await.unwrap();

        assert_eq!(stats.row_count, 1);
        assert!(stats.partial);
        assert!(stats.results.starts_with("[MefSoamDmHistoryStatsEntry{dot1agCfmMdIndex=1"));
        assert!(stats.results.contains("mefSoamDmHistoryStatsIndex=1,"));
        assert!(stats.results.ends_with("}]"));
    }

    #[tokio::test]
    async fn unreachable_agent_resolves_with_transport_fault() {
        let net = Arc::new(SimulatedNetwork::new());
        let fault = service(net).query(credential()).await.unwrap_err();
        assert_eq!(fault.category, FaultCategory::Transport);
    }

    #[tokio::test]
    async fn looping_agent_resolves_with_protocol_fault() {
        let net = Arc::new(SimulatedNetwork::new());
        seed(&net, 1, true);
        net.set_fault(AGENT, AgentFault::Loop);

        let fault = service(net).query(credential()).await.unwrap_err();
        assert_eq!(fault.category, FaultCategory::Protocol);
    }

    #[tokio::test]
    async fn worker_panic_resolves_as_internal() {
        let net = Arc::new(SimulatedNetwork::new());
        net.set_fault(AGENT, AgentFault::Panic);

        let fault = service(net).query(credential()).await.unwrap_err();
        assert_eq!(fault.category, FaultCategory::Internal);
        assert!(fault.message.contains("crashed"));
    }

    #[tokio::test]
    async fn closed_service_refuses_queries() {
        let net = Arc::new(SimulatedNetwork::new());
        seed(&net, 1, true);
        let service = service(net);
        service.close();

        let fault = service.query(credential()).await.unwrap_err();
        assert_eq!(fault.category, FaultCategory::Internal);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_agent_resolves_within_walk_budget() {
        let net = Arc::new(SimulatedNetwork::new());
        seed(&net, 1, true);
        net.set_fault(AGENT, AgentFault::Slow(Duration::from_secs(120)));

        let started = tokio::time::Instant::now();
        let fault = service(net).query(credential()).await.unwrap_err();

        assert_eq!(fault.category, FaultCategory::Transport);
        assert!(started.elapsed() <= Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn queued_query_shares_the_walk_budget() {
        let net = Arc::new(SimulatedNetwork::new());
        seed(&net, 1, true);
        net.set_fault(AGENT, AgentFault::Slow(Duration::from_secs(120)));
        let service = QueryService::new(
            net,
            TableWalker::default(),
            Arc::new(dm_history_shape()),
            1,
        );

        let started = tokio::time::Instant::now();
        let first = service.query(credential());
        let second = service.query(credential());
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap_err().category, FaultCategory::Transport);
        assert_eq!(second.unwrap_err().category, FaultCategory::Transport);
        assert!(started.elapsed() <= Duration::from_secs(31));
    }
}
