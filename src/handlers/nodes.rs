use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tokio::time::Duration;

use super::AppState;
use crate::models::{AddNodeRequest, AddNodeResponse, NodeList};

pub async fn add_node(
    State(state): State<AppState>,
    Json(params): Json<AddNodeRequest>,
) -> Result<(StatusCode, Json<AddNodeResponse>), (StatusCode, String)> {
    if params.id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "id must not be empty".to_string()));
    }
    if params.address.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "address must not be empty".to_string()));
    }
    let interval = match params.poll_interval_secs {
        Some(0) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        Some(secs) => Duration::from_secs(secs),
        None => state.default_poll_interval,
    };
    let community = params
        .community
        .as_deref()
        .unwrap_or(&state.default_community);

    state
        .provider
        .add_node(&params.id, &params.address, community, interval);

    Ok((
        StatusCode::CREATED,
        Json(AddNodeResponse {
            id: params.id,
            address: params.address,
        }),
    ))
}

/// Неизвестные id тоже принимаются.
pub async fn remove_node(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.provider.remove_node(&id);
    StatusCode::NO_CONTENT
}

pub async fn list_nodes(State(state): State<AppState>) -> Json<NodeList> {
    Json(NodeList {
        nodes: state.provider.node_ids(),
    })
}
