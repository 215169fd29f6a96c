//! Request tracking middleware
//! Records every request that reaches the app into the shared access log

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::access_log::AccessLog;
use crate::client_ip::client_ip;

/// Tracker state: where to record and which paths to leave out
pub struct Tracker {
    log: Arc<AccessLog>,
    excluded_prefixes: Vec<String>,
}

impl Tracker {
    pub fn new(log: Arc<AccessLog>, excluded_prefixes: Vec<String>) -> Self {
        Self {
            log,
            excluded_prefixes,
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

fn millis_saturating(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Middleware for `axum::middleware::from_fn_with_state`.
pub async fn track_access(
    State(tracker): State<Arc<Tracker>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if tracker.is_excluded(&path) {
        return next.run(request).await;
    }

    let method = request.method().as_str().to_string();
    let source = client_ip(request.headers());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = millis_saturating(started.elapsed());

    tracker.log.insert(
        &source,
        &path,
        &method,
        user_agent.as_deref(),
        Some(response.status().as_u16()),
        Some(elapsed_ms),
    );
    response
}
