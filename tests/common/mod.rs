#![allow(dead_code)]

use std::sync::Arc;

use soam_collector::collector::{BroadcastPublisher, LocalEventSources};
use soam_collector::mib::{dm_history, dm_history_shape};
use soam_collector::provider::{ProviderParts, SoamProvider};
use soam_collector::snmp::SnmpValue;
use soam_collector::snmp::sim::SimulatedNetwork;
use soam_collector::table::TableWalker;
use tokio::time::Duration;

pub struct Harness {
    pub net: Arc<SimulatedNetwork>,
    pub publisher: Arc<BroadcastPublisher>,
    pub sources: LocalEventSources,
    pub provider: Arc<SoamProvider>,
}

pub fn harness() -> Harness {
    let net = Arc::new(SimulatedNetwork::new());
    let publisher = Arc::new(BroadcastPublisher::new(32));
    let sources = LocalEventSources::new();
    let provider = Arc::new(SoamProvider::new(ProviderParts {
        session: net.clone(),
        walker: TableWalker::default(),
        shape: dm_history_shape(),
        publisher: publisher.clone(),
        sources: Arc::new(sources.clone()),
        period: Duration::from_secs(60),
        max_concurrent_queries: 4,
    }));
    Harness {
        net,
        publisher,
        sources,
        provider,
    }
}

/// Один полный интервал измерения на `address`, со средней односторонней задержкой вперёд.
pub fn seed_interval(net: &SimulatedNetwork, address: &str, history_index: u32, two_way_avg: u32) {
    net.set_row(
        address,
        &dm_history::default_entry_oid(),
        &[1, 1, 1, 1, history_index],
        [
            (1, SnmpValue::Unsigned32(history_index)),
            (2, SnmpValue::OctetString(vec![0x07, 0xea, 10, 19, 9, 0, 0, 0])),
            (3, SnmpValue::Unsigned32(90_000)),
            (4, SnmpValue::Integer(2)),
            (5, SnmpValue::Unsigned32(two_way_avg / 2)),
            (6, SnmpValue::Unsigned32(two_way_avg * 2)),
            (7, SnmpValue::Unsigned32(two_way_avg)),
            (10, SnmpValue::Unsigned32(two_way_avg / 2)),
        ],
    );
}
