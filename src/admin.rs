//! Admin API for RouterWatch
//! Read access to the access log, gated by a shared secret

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::access_log::{AccessLog, LogQuery};

pub const ACCESS_LOGS_PATH: &str = "/api/admin/access-logs";

/// Admin state
pub struct AdminState {
    pub log: Arc<AccessLog>,
    password: Option<String>,
}

impl AdminState {
    pub fn new(log: Arc<AccessLog>, password: Option<String>) -> Self {
        Self { log, password }
    }

    /// Without a configured secret nothing is authorized.
    fn is_authorized(&self, supplied: Option<&str>) -> bool {
        match (self.password.as_deref(), supplied) {
            (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
            _ => false,
        }
    }
}

/// Query string accepted by the access log endpoint. Numbers are kept as text
/// so a malformed `limit` or `offset` falls back to its default instead of
/// rejecting the request.
#[derive(Deserialize, Debug, Default)]
struct AccessLogParams {
    action: Option<String>,
    ip: Option<String>,
    path: Option<String>,
    method: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
    #[serde(rename = "adminPassword")]
    admin_password: Option<String>,
}

impl AccessLogParams {
    fn page(&self) -> LogQuery {
        LogQuery::page(parse_count(&self.limit), parse_count(&self.offset))
    }

    fn filter(&self) -> LogQuery {
        LogQuery {
            source_address: self.ip.clone(),
            path_substring: self.path.clone(),
            method: self.method.clone(),
            ..self.page()
        }
    }
}

fn parse_count(raw: &Option<String>) -> Option<usize> {
    raw.as_deref().and_then(|v| v.trim().parse().ok())
}

/// Create the admin router
pub fn admin_router(state: Arc<AdminState>) -> Router {
    Router::new()
        .route(ACCESS_LOGS_PATH, get(access_logs).delete(clear_access_logs))
        .with_state(state)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
}

async fn access_logs(
    State(state): State<Arc<AdminState>>,
    Query(params): Query<AccessLogParams>,
) -> Response {
    if !state.is_authorized(params.admin_password.as_deref()) {
        tracing::warn!(action = ?params.action, "admin request refused");
        return unauthorized();
    }

    match params.action.as_deref() {
        Some("stats") => Json(state.log.stats()).into_response(),
        Some("unique-ips") => Json(json!({ "ips": state.log.unique_source_addresses() })).into_response(),
        Some("filter") => {
            let (logs, total) = state.log.page(&params.filter());
            Json(json!({ "logs": logs, "total": total })).into_response()
        }
        Some("export") => match state.log.export_json() {
            Ok(body) => (
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "access log export failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        },
        _ => {
            let (logs, total) = state.log.page(&params.page());
            Json(json!({ "logs": logs, "total": total })).into_response()
        }
    }
}

async fn clear_access_logs(
    State(state): State<Arc<AdminState>>,
    Query(params): Query<AccessLogParams>,
) -> Response {
    if !state.is_authorized(params.admin_password.as_deref()) {
        tracing::warn!("admin clear refused");
        return unauthorized();
    }
    state.log.clear();
    StatusCode::NO_CONTENT.into_response()
}
