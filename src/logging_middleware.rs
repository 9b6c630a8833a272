// src/logging_middleware.rs
//! Middleware for logging one line per request

use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::auth::session::SESSION_COOKIE;
use crate::common::safe_token_log;

/// Logs method, path, status and latency. The session token, when present,
/// is only ever logged in masked form.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let session = CookieJar::from_headers(request.headers())
        .get(SESSION_COOKIE)
        .map(|cookie| safe_token_log(cookie.value()));

    debug!(
        method = %method,
        path = %path,
        session = session.as_deref().unwrap_or("none"),
        "📥 Request"
    );

    let started = Instant::now();
    let response = next.run(request).await;
    let latency_ms = started.elapsed().as_millis() as u64;
    let status = response.status();

    if status.is_server_error() {
        warn!(method = %method, path = %path, status = %status, latency_ms, "📤 Response");
    } else {
        info!(method = %method, path = %path, status = %status, latency_ms, "📤 Response");
    }

    response
}
