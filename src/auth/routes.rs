//! Authentication routes

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use super::session::require_session;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /auth/google/login` - Redirect to Google consent
/// - `GET /auth/google/callback` - OAuth callback, sets the session cookie
/// - `POST /auth/logout` - Clear the session cookie
/// - `GET /api/me` - Current user's stored profile (session required)
pub fn auth_routes() -> Router {
    let protected = Router::new()
        .route("/api/me", get(handlers::me_handler))
        .route_layer(middleware::from_fn(require_session));

    Router::new()
        .route("/auth/google/login", get(handlers::google_login))
        .route("/auth/google/callback", get(handlers::google_callback))
        .route("/auth/logout", post(handlers::logout_handler))
        .merge(protected)
}
