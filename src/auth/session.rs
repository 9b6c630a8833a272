//! Session gate for protected routes
//!
//! Reads the session cookie, verifies it and attaches the caller's identity
//! to the request. Every failure is a 401 with a generic body; the reason is
//! only logged.

use axum::{
    extract::{Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::extractors::AuthedUser;
use super::token::{TokenCodec, TokenError};
use crate::common::config::CookieConfig;
use crate::common::{safe_token_log, ApiError, AppState};

pub const SESSION_COOKIE: &str = "ppet_token";

#[derive(Debug, Error, PartialEq)]
pub enum GateRejection {
    #[error("no session cookie")]
    MissingCookie,

    #[error("invalid session token: {0}")]
    InvalidToken(#[from] TokenError),
}

/// Resolves the caller from the request headers. The token is only parsed
/// when a non-empty session cookie is present.
pub fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Result<AuthedUser, GateRejection> {
    let jar = CookieJar::from_headers(headers);
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
        .ok_or(GateRejection::MissingCookie)?;

    let claims = codec.verify(token).map_err(|e| {
        warn!(reason = %e, token = %safe_token_log(token), "Session token rejected");
        GateRejection::InvalidToken(e)
    })?;

    Ok(AuthedUser {
        id: claims.user_id,
        email: claims.email,
    })
}

/// Middleware in front of every protected route
pub async fn require_session(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match authenticate(&state.tokens, request.headers()) {
        Ok(user) => {
            debug!(user_id = %user.id, "Session accepted");
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(GateRejection::MissingCookie) => {
            debug!(path = %request.uri().path(), "Request without session cookie");
            Err(ApiError::Unauthorized("unauthorized".to_string()))
        }
        Err(GateRejection::InvalidToken(_)) => {
            Err(ApiError::Unauthorized("invalid token".to_string()))
        }
    }
}

/// Session cookie carrying a freshly issued token
pub fn session_cookie(token: String, ttl: Duration, config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Expired cookie that makes the user agent drop the session
pub fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}
