//! RouterWatch backend
//! Access tracking and admin reporting for the router dashboard

pub mod access_log;
pub mod admin;
pub mod client_ip;
pub mod config;
pub mod tracker;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use access_log::AccessLog;
use admin::{admin_router, AdminState};
use config::Config;
use tracker::{track_access, Tracker};

/// Build the full application around an already constructed access log.
pub fn app(log: Arc<AccessLog>, config: &Config) -> Router {
    let admin_state = Arc::new(AdminState::new(log.clone(), config.admin.password.clone()));
    let tracker = Arc::new(Tracker::new(
        log.clone(),
        config.access_log.excluded_prefixes.clone(),
    ));

    Router::new()
        .route("/api/health", get(health))
        .with_state(log)
        .merge(admin_router(admin_state))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(tracker, track_access))
        .layer(TraceLayer::new_for_http())
}

async fn health(State(log): State<Arc<AccessLog>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "records": log.len(),
    }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}
