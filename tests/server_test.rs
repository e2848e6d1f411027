//! Tests for the HTTP transport.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tilewar::server::router;
use tilewar::{ArenaConfig, RoundRegistry};
use tower::ServiceExt;

fn app() -> (Router, Arc<RoundRegistry>) {
    let registry = Arc::new(RoundRegistry::new(
        ArenaConfig::default().with_poll_interval(Duration::from_millis(2)),
    ));
    (router(registry.clone()), registry)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn wait_for(app: &Router, uri: &str, field: &str) -> Value {
    for _ in 0..500 {
        let (_, body) = call(app, "GET", uri, None).await;
        if body[field] == json!(true) || (field == "round_score" && !body[field].is_null()) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("{} never became set on {}", field, uri);
}

#[tokio::test]
async fn test_create_play_and_surrender() {
    let (app, registry) = app();
    let (status, created) = call(&app, "POST", "/rounds", Some(json!({ "board_shape": "[2,2]" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["message"], "A new game might have started");
    let id = created["uuid"].as_str().unwrap().to_string();
    let uri = format!("/rounds/{}", id);

    let view = wait_for(&app, &uri, "defender_wait").await;
    assert_eq!(view["message"], "Current situation");
    assert_eq!(view["attacker_type"], "Random");
    assert_eq!(view["defender_type"], "Remote");
    assert!(view["round_score"].is_null());

    let (_, reply) = call(&app, "POST", &format!("{}/attack", uri), Some(json!({ "instruction": "0,0" }))).await;
    assert_eq!(reply["message"], "Attack is not possible now");
    assert_eq!(reply["accepted"], false);

    let (_, reply) = call(&app, "POST", &format!("{}/defend", uri), Some(json!({ "instruction": "giveup" }))).await;
    assert_eq!(reply["message"], "Defender surrendered");
    assert_eq!(reply["uuid"], id.as_str());

    let view = wait_for(&app, &uri, "round_score").await;
    assert!(view["round_score"].is_u64());
    tokio::task::spawn_blocking(move || registry.shutdown()).await.unwrap();
}

#[tokio::test]
async fn test_defend_instruction_is_echoed() {
    let (app, registry) = app();
    let (_, created) = call(
        &app,
        "POST",
        "/rounds",
        Some(json!({ "board_tiles": "[[2,0],[0,0]]", "attacker_type": "Strategy", "defender_type": "Online" })),
    )
    .await;
    let uri = format!("/rounds/{}", created["uuid"].as_str().unwrap());
    wait_for(&app, &uri, "defender_wait").await;

    let (_, reply) = call(&app, "POST", &format!("{}/defend", uri), Some(json!({ "instruction": "x,1" }))).await;
    assert_eq!(reply["message"], "Defend instruction is sent");
    assert_eq!(reply["defender_instruction"]["dimension"], -1);
    assert_eq!(reply["defender_instruction"]["direction"], 1);
    tokio::task::spawn_blocking(move || registry.shutdown()).await.unwrap();
}

#[tokio::test]
async fn test_bad_requests() {
    let (app, _registry) = app();

    let (status, body) = call(&app, "POST", "/rounds", Some(json!({ "attacker_type": "Wizard" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["uuid"].is_null());

    let (status, _) = call(&app, "POST", "/rounds", Some(json!({ "board_shape": "[1,1]" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, "GET", &format!("/rounds/{}", uuid::Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Nothing happened");
}

#[tokio::test]
async fn test_admission_limit_over_http() {
    let registry = Arc::new(RoundRegistry::new(
        ArenaConfig::default()
            .with_admission_cap(0)
            .with_poll_interval(Duration::from_millis(2)),
    ));
    let app = router(registry);
    let (status, body) = call(&app, "POST", "/rounds", Some(json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Too many players, please wait and retry later");
}

#[tokio::test]
async fn test_invitation_flow() {
    let (app, registry) = app();
    let (_, empty) = call(&app, "GET", "/rounds/unoccupied", None).await;
    assert!(empty["unoccupied"].is_null());

    let (_, created) = call(
        &app,
        "POST",
        "/rounds",
        Some(json!({
            "attacker_type": "Online",
            "defender_type": "Online",
            "unoccupied_role": "Attacker"
        })),
    )
    .await;
    let id = created["uuid"].as_str().unwrap().to_string();

    let (_, listed) = call(&app, "GET", "/rounds/unoccupied", None).await;
    assert_eq!(listed["unoccupied"]["round_uuid"], id.as_str());
    assert_eq!(listed["unoccupied"]["unoccupied_role"], "Attacker");

    let (status, claimed) = call(&app, "POST", &format!("/rounds/{}/claim/Attacker", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["message"], "Attacker role claimed");

    let (_, listed) = call(&app, "GET", "/rounds/unoccupied", None).await;
    assert!(listed["unoccupied"].is_null());
    tokio::task::spawn_blocking(move || registry.shutdown()).await.unwrap();
}
