//! Authentication data models

use serde::{Deserialize, Serialize};

use crate::services::google::ProviderIdentity;

/// Claims carried inside the signed session token (JWT)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Persisted user profile, keyed by the provider subject id
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: String,
}

impl From<ProviderIdentity> for User {
    fn from(identity: ProviderIdentity) -> Self {
        Self {
            user_id: identity.subject_id,
            email: identity.email,
            name: identity.display_name,
            picture: identity.avatar_url,
        }
    }
}

/// Query parameters of the OAuth callback
#[derive(Deserialize, Debug, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}
