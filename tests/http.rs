mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{Harness, harness, seed_interval};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use soam_collector::handlers::AppState;
use soam_collector::models::NodeList;
use soam_collector::routes::create_router;
use soam_collector::snmp::sim::AgentFault;
use tokio::time::Duration;
use tower::ServiceExt;

fn app(h: &Harness) -> Router {
    create_router(AppState {
        provider: h.provider.clone(),
        default_community: "public".to_string(),
        default_poll_interval: Duration::from_secs(60),
    })
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn history_stats_route_returns_rendered_records() {
    let h = harness();
    seed_interval(&h.net, "192.0.2.1", 4, 220);

    let response = app(&h)
        .oneshot(post(
            "/history-stats",
            json!({"ip_address": "192.0.2.1", "community": "public"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["row_count"], 1);
    assert_eq!(body["partial"], false);
    assert!(
        body["results"]
            .as_str()
            .unwrap()
            .contains("mefSoamDmHistoryStatsIndex=4")
    );
}

#[tokio::test]
async fn history_stats_route_maps_fault_categories() {
    let h = harness();
    seed_interval(&h.net, "192.0.2.2", 1, 220);
    h.net.set_fault("192.0.2.2", AgentFault::Loop);

    let unreachable = app(&h)
        .oneshot(post(
            "/history-stats",
            json!({"ip_address": "192.0.2.99", "community": "public"}),
        ))
        .await
        .unwrap();
    assert_eq!(unreachable.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(unreachable).await["category"], "transport");

    let looping = app(&h)
        .oneshot(post(
            "/history-stats",
            json!({"ip_address": "192.0.2.2", "community": "public"}),
        ))
        .await
        .unwrap();
    assert_eq!(looping.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(looping).await["category"], "protocol");
}

#[tokio::test]
async fn node_administration_round_trip() {
    let h = harness();
    let app = app(&h);

    let created = app
        .clone()
        .oneshot(post(
            "/nodes",
            json!({"id": "pe-1", "address": "192.0.2.1", "poll_interval_secs": 30}),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let listed = app
        .clone()
        .oneshot(Request::get("/nodes").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let nodes: NodeList = serde_json::from_value(body_json(listed).await).unwrap();
    assert_eq!(nodes.nodes, vec!["pe-1".to_string()]);

    for id in ["pe-1", "never-added"] {
        let removed = app
            .clone()
            .oneshot(
                Request::delete(format!("/nodes/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(removed.status(), StatusCode::NO_CONTENT);
    }
    assert!(h.provider.node_ids().is_empty());
}

#[tokio::test]
async fn zero_poll_interval_is_rejected() {
    let h = harness();
    let response = app(&h)
        .oneshot(post(
            "/nodes",
            json!({"id": "pe-1", "address": "192.0.2.1", "poll_interval_secs": 0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.provider.node_ids().is_empty());
}

#[tokio::test]
async fn health_reports_state() {
    let h = harness();
    let response = app(&h)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["collecting"], false);
}
