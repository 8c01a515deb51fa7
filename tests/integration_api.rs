//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use household_sim::api::{AppState, router};
use household_sim::config::ScenarioConfig;
use household_sim::service::Service;
use household_sim::sim::engine::Engine;

/// Run the summer-evening script headlessly, then hand the engine to a
/// manually clocked service.
fn build_api_state() -> (Service, Arc<AppState>) {
    let scenario = ScenarioConfig::summer_evening();
    let mut engine = Engine::new(scenario.sim_config());
    engine.run_script(scenario.simulation.ticks, &scenario.script);

    let service = Service::spawn_manual(engine, Vec::new());
    let state = Arc::new(AppState {
        service: service.handle(),
    });
    (service, state)
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = router(Arc::clone(state)).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_command(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/commands")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn full_scenario_state_endpoint() {
    let (_service, state) = build_api_state();
    let (status, json) = send(&state, get("/state")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ticks"], 900);
    // scenario ends with a hall light, the bedroom light, and the bedroom AC on
    assert_eq!(json["total_w"], 1530);
    assert_eq!(json["rooms"][1]["name"], "Bedroom");
    let indoor = json["indoor_c"].as_f64().unwrap();
    assert!((15.0..=35.0).contains(&indoor));
}

#[tokio::test]
async fn room_endpoint_shows_slots() {
    let (_service, state) = build_api_state();
    let (status, json) = send(&state, get("/rooms/Hall")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Hall");
    let slots = json["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 5);
    assert_eq!(slots[0]["slot"], "light_array");
    assert_eq!(slots[0]["on"], serde_json::json!([true, false]));
}

#[tokio::test]
async fn commands_flow_through_to_state() {
    let (_service, state) = build_api_state();

    let (status, json) = send(
        &state,
        post_command(r#"{"action":"turn_off_thermostat","room":"Bedroom","kind":"ac"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_w"], 30);

    let (status, json) = send(&state, get("/state")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_w"], 30);
}

#[tokio::test]
async fn command_errors_map_to_statuses() {
    let (_service, state) = build_api_state();

    let (status, json) = send(
        &state,
        post_command(r#"{"action":"toggle_tv","room":"Garage"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("Garage"));

    let (status, _) = send(
        &state,
        post_command(r#"{"action":"change_fan_speed","room":"Toilet","delta":1}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn telemetry_follows_live_ticks() {
    let (_service, state) = build_api_state();
    state.service.advance(200 * 10).await.unwrap();

    let (status, json) = send(&state, get("/telemetry")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["tick"], 900);

    let (status, json) = send(&state, get("/telemetry?from=905&to=907")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 3);

    let (status, _) = send(&state, get("/telemetry?from=7&to=3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
