use std::sync::Arc;

use tokio::time::Duration;

use crate::provider::SoamProvider;

pub mod health;
pub mod history;
pub mod nodes;

pub use health::health;
pub use history::handle_history_stats;
pub use nodes::{add_node, list_nodes, remove_node};

/// Общее для всех хендлеров.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<SoamProvider>,
    /// Для узлов, добавленных без community
    pub default_community: String,
    /// Для узлов, добавленных без интервала опроса
    pub default_poll_interval: Duration,
}
