//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::error;

use crate::common::ApiError;

/// Authenticated caller, attached to the request by the session gate
///
/// Handlers take this as a parameter; it never falls back to an anonymous
/// caller. Reaching a handler without it means the route was mounted without
/// the gate, which is reported as a server error.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthedUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                error!(
                    path = %parts.uri.path(),
                    "Handler requires an authenticated user but no session gate ran"
                );
                Err(ApiError::InternalServer(
                    "missing authenticated principal".to_string(),
                ))
            }
        }
    }
}
