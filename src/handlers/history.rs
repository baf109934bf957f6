use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use super::AppState;
use crate::error::{FaultCategory, QueryFault};
use crate::models::HistoryStatsInput;
use crate::query::HistoryStats;

/// `GetHistoryStats`: обходит агента сейчас и отвечает списком записей в текстовом виде.
pub async fn handle_history_stats(
    State(state): State<AppState>,
    Json(params): Json<HistoryStatsInput>,
) -> Result<Json<HistoryStats>, (StatusCode, Json<QueryFault>)> {
    match state.provider.get_history_stats(&params).await {
        Ok(stats) => Ok(Json(stats)),
        Err(fault) => {
            warn!(
                agent = %params.ip_address,
                category = %fault.category,
                "history query failed: {}",
                fault.message
            );
            Err((status_for(fault.category), Json(fault)))
        }
    }
}

fn status_for(category: FaultCategory) -> StatusCode {
    match category {
        FaultCategory::Transport => StatusCode::GATEWAY_TIMEOUT,
        FaultCategory::Protocol => StatusCode::BAD_GATEWAY,
        FaultCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_fault_category_has_a_status() {
        let mapped: Vec<(String, u16)> = [
            FaultCategory::Transport,
            FaultCategory::Protocol,
            FaultCategory::Internal,
        ]
        .into_iter()
        .map(|c| (c.to_string(), status_for(c).as_u16()))
        .collect();

        assert_eq!(
            mapped,
            vec![
                ("TransportError".to_string(), 504),
                ("ProtocolError".to_string(), 502),
                ("InternalError".to_string(), 500),
            ]
        );
    }

    #[test]
    fn fault_body_uses_snake_case_category() {
        let fault = QueryFault::internal("query service is closed");
        let body = serde_json::to_value(&fault).unwrap();
        assert_eq!(body["category"], "internal");
        assert_eq!(body["message"], "query service is closed");
    }
}
