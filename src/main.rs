use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use soam_collector::collector::{BroadcastPublisher, LocalEventSources};
use soam_collector::config::AppConfig;
use soam_collector::formatter::JsonFormatter;
use soam_collector::handlers::AppState;
use soam_collector::mib::dm_history_shape;
use soam_collector::provider::{ProviderParts, SoamProvider};
use soam_collector::routes::create_router;
use soam_collector::snmp::Snmp2Session;
use soam_collector::table::TableWalker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    config.debug_config();

    let publisher = Arc::new(BroadcastPublisher::new(
        config.settings.events.channel_capacity,
    ));
    let session = Arc::new(Snmp2Session::open(config.get_request_timeout()));
    let shape = dm_history_shape().with_entry(config.dm_history_entry()?);

    let provider = Arc::new(SoamProvider::new(ProviderParts {
        session,
        walker: TableWalker::new(config.walk_settings()),
        shape,
        publisher: publisher.clone(),
        sources: Arc::new(LocalEventSources::new()),
        period: config.get_poll_period(),
        max_concurrent_queries: config.settings.query.max_concurrent,
    }));

    for node in &config.nodes {
        let credential = config.node_credential(node);
        provider.add_node(
            &node.id,
            credential.address(),
            credential.community(),
            Duration::from_secs(node.poll_interval_secs),
        );
    }

    let mut events = publisher.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match JsonFormatter::to_json_compact(&event) {
                    Ok(line) => info!(target: "soam_events", "{}", line),
                    Err(e) => warn!("failed to render event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    provider.init();

    let app = create_router(AppState {
        provider: provider.clone(),
        default_community: config.get_community(),
        default_poll_interval: config.get_poll_period(),
    });

    let listen = config.get_listen();
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {}", listen))?;
    info!("listening on {}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    provider.close().await;
    Ok(())
}
