use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    AppState, add_node, handle_history_stats, health, list_nodes, remove_node,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/history-stats", post(handle_history_stats))
        .route("/nodes", get(list_nodes).post(add_node))
        .route("/nodes/{id}", delete(remove_node))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
