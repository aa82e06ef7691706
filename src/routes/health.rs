use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// `GET /health` — lightweight liveness probe.
async fn root_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /api/v1/health` — detailed health check with database connectivity.
async fn api_health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.db.ping().await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}

/// Root-level health route (no `/api/v1` prefix, used by the platform).
pub fn root_router() -> Router<AppState> {
    Router::new().route("/health", get(root_health))
}

/// Versioned health route.
pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(api_health))
}
