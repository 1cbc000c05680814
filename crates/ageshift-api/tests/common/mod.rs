//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ageshift_core::progress::ProgressStore;
use ageshift_test_support::{InMemoryProgressStore, ScriptedAssetFetcher};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use ageshift_api::config::GameConfig;
use ageshift_api::routes;
use ageshift_api::state::AppState;
use ageshift_api::wiring::{self, Collaborators};

/// Game data bundled with the repository.
const GAME_YAML: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../config/game.yaml"
));

/// Start the engine on the bundled game data with immediate asset fetches.
pub async fn start_engine(progress: Arc<dyn ProgressStore>) -> AppState {
    let game = GameConfig::from_yaml_str(GAME_YAML).unwrap();
    let collaborators = Collaborators {
        fetcher: Arc::new(ScriptedAssetFetcher::immediate()),
        progress,
        audio: None,
        haptics: None,
        director: None,
        dialogue: None,
    };
    wiring::start(&game, collaborators, Duration::from_millis(1))
        .await
        .unwrap()
}

/// Build the full app router over `state`. Uses the same route structure
/// as `main.rs`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/ages", routes::ages::router())
        .nest("/api/v1/progress", routes::progress::router())
        .with_state(state)
}

/// Build the full app router on a fresh engine with empty progress.
pub async fn build_test_app() -> (Router, AppState) {
    let state = start_engine(Arc::new(InMemoryProgressStore::new())).await;
    (build_router(state.clone()), state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
