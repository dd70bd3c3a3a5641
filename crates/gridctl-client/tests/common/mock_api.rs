//! Mock control API for integration tests.
//!
//! Serves canned responses for the backend REST surface and records the
//! JSON bodies it receives.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Default)]
struct ApiState {
    received: Vec<(String, Value)>,
    fail_start: bool,
}

type Shared = Arc<Mutex<ApiState>>;

/// A mock control API bound to an ephemeral port.
pub struct MockApi {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockApi {
    /// Start a new mock API on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state: Shared = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new()
            .route("/symbols/", get(configured_symbols).post(replace_symbols))
            .route("/list/symbols/", get(tradable_symbols))
            .route("/grid-bot/status", get(status))
            .route("/grid-bot/start-symbol", post(start_symbol))
            .route("/stop_symbol", post(stop_symbol))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL of the mock API.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make start requests answer HTTP 400.
    pub async fn fail_start(&self) {
        self.state.lock().await.fail_start = true;
    }

    /// Bodies received, as (path, body) pairs.
    pub async fn received(&self) -> Vec<(String, Value)> {
        self.state.lock().await.received.clone()
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

async fn configured_symbols() -> Json<Value> {
    Json(json!({
        "symbols": [
            {"symbol": "BTCUSDT", "configs": [{"tp_percent": 2.5, "sl_percent": 1.5}]},
            {"symbol": "ETHUSDT", "configs": []}
        ]
    }))
}

async fn tradable_symbols() -> Json<Value> {
    Json(json!({"symbols": ["BTCUSDT", "ETHUSDT", "SOLUSDC"]}))
}

async fn status() -> Json<Value> {
    Json(json!({
        "global_status": "running",
        "active_symbols": {
            "BTCUSDT": {"status": "running", "exchanges": ["binance", "kraken"]},
            "ETHUSDT": {"status": "stopped", "exchanges": []}
        }
    }))
}

async fn replace_symbols(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    state.lock().await.received.push(("/symbols/".to_string(), body));
    Json(json!({"message": "ok"}))
}

async fn start_symbol(State(state): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    let mut state = state.lock().await;
    state
        .received
        .push(("/grid-bot/start-symbol".to_string(), body));
    if state.fail_start {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Error: No exchange selected."})),
        );
    }
    (StatusCode::OK, Json(json!({"message": "started"})))
}

async fn stop_symbol(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    state
        .lock()
        .await
        .received
        .push(("/stop_symbol".to_string(), body));
    Json(json!({"status": "success"}))
}
