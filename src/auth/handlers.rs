//! Authentication handlers

use axum::{
    extract::{Extension, Json, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::extractors::AuthedUser;
use super::models::{CallbackParams, User};
use super::session::{removal_cookie, session_cookie};
use super::token::{session_ttl, TokenError};
use crate::common::{generate_oauth_state, safe_email_log, ApiError, AppState};
use crate::services::google::GoogleError;
use crate::store::StoreError;

/// Failures of the OAuth callback. Each variant is logged with its detail;
/// the client only gets a plain-text category message.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("provider returned error: {0}")]
    ProviderDenied(String),

    #[error("missing authorization code")]
    MissingCode,

    #[error("code exchange failed: {0}")]
    Exchange(#[from] GoogleError),

    #[error("failed to save user: {0}")]
    SaveUser(#[from] StoreError),

    #[error("failed to issue session token: {0}")]
    Token(#[from] TokenError),
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            LoginError::ProviderDenied(_) => {
                (StatusCode::BAD_REQUEST, "authorization was denied by the provider")
            }
            LoginError::MissingCode => (StatusCode::BAD_REQUEST, "missing code"),
            LoginError::Exchange(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to get user info")
            }
            LoginError::SaveUser(_) => (StatusCode::INTERNAL_SERVER_ERROR, "failed to save user"),
            LoginError::Token(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to generate token")
            }
        };
        (status, body).into_response()
    }
}

/// 302 redirect; axum's `Redirect` only offers 303/307/308
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Runs the callback steps in order, stopping at the first failure:
/// provider error check, code check, code exchange, user upsert, token issue.
/// Returns the signed session token.
pub async fn complete_login(state: &AppState, params: CallbackParams) -> Result<String, LoginError> {
    if let Some(provider_error) = params.error.filter(|e| !e.is_empty()) {
        warn!(oauth_error = %provider_error, "Google OAuth callback carried an error");
        return Err(LoginError::ProviderDenied(provider_error));
    }

    // state is not verified
    debug!(state_present = params.state.is_some(), "OAuth callback received");

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            warn!("OAuth callback without authorization code");
            LoginError::MissingCode
        })?;

    let identity = state.identity.exchange_code(&code).await.map_err(|e| {
        error!(error = %e, "Failed to exchange authorization code");
        LoginError::Exchange(e)
    })?;

    let user = User::from(identity);
    state.users.upsert_user(&user).await.map_err(|e| {
        error!(error = %e, user_id = %user.user_id, "Failed to upsert user during login");
        LoginError::SaveUser(e)
    })?;

    let token = state
        .tokens
        .issue(&user.user_id, &user.email, session_ttl())
        .map_err(|e| {
            error!(error = %e, user_id = %user.user_id, "Failed to sign session token");
            LoginError::Token(e)
        })?;

    info!(
        user_id = %user.user_id,
        email = %safe_email_log(&user.email),
        provider = "google",
        "User authenticated via Google OAuth"
    );

    Ok(token)
}

/// GET /auth/google/login - Start Google OAuth flow
/// Redirects the user agent to Google's consent page
pub async fn google_login(Extension(state): Extension<Arc<AppState>>) -> Response {
    let url = state.identity.authorization_url(&generate_oauth_state());
    info!("Redirecting to Google OAuth");
    found(&url)
}

/// GET /auth/google/callback - Handle OAuth callback from Google
/// Sets the session cookie and redirects to the frontend
pub async fn google_callback(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), LoginError> {
    let token = complete_login(&state, params).await?;
    let jar = jar.add(session_cookie(token, session_ttl(), &state.cookie));
    Ok((jar, found(&state.frontend_url)))
}

/// POST /auth/logout
/// Tells the user agent to drop the session cookie. The token itself stays
/// valid until it expires.
pub async fn logout_handler(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    info!("User logout");
    (jar.add(removal_cookie(&state.cookie)), StatusCode::NO_CONTENT)
}

/// GET /api/me
/// Returns the stored profile of the authenticated user
pub async fn me_handler(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
) -> Result<Json<User>, ApiError> {
    match state.users.get_user(&authed.id).await? {
        Some(user) => Ok(Json(user)),
        None => {
            warn!(user_id = %authed.id, "Valid session for a user without a stored profile");
            Err(ApiError::NotFound("user not found".to_string()))
        }
    }
}
