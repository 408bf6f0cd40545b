//! HTTP/WebSocket surface
//!
//! One router serves the whole service: the `/ws` upgrade endpoint, a
//! `/healthz` stats endpoint, and the static client assets as the fallback.

pub mod handler;
pub mod messages;

use crate::hub::Hub;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the service router around a shared hub
pub fn build_router(hub: Arc<Hub>, static_dir: &Path) -> Router {
    Router::new()
        .route("/ws", get(handler::websocket_handler))
        .route("/healthz", get(healthz))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

/// Health endpoint: liveness plus the hub's counters
async fn healthz(State(hub): State<Arc<Hub>>) -> Json<serde_json::Value> {
    let stats = hub.stats().await;
    Json(serde_json::json!({
        "status": "ok",
        "stats": stats,
    }))
}
