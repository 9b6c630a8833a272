// src/services/google.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::common::config::GoogleConfig;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid email profile";

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Userinfo missing required field: {0}")]
    MissingField(&'static str),
}

/// Verified user attributes returned by the identity provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderIdentity {
    pub subject_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
}

/// Turns an authorization code into a verified identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the user agent is redirected to for consent
    fn authorization_url(&self, state: &str) -> String;

    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, GoogleError>;
}

/// Google OAuth endpoints; overridable so tests can point at a mock server
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: Option<String>,
    email: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    picture: String,
}

#[derive(Debug, Clone)]
pub struct GoogleService {
    config: GoogleConfig,
    endpoints: GoogleEndpoints,
    client: Client,
}

impl GoogleService {
    pub fn new(config: GoogleConfig) -> Self {
        Self::with_endpoints(config, GoogleEndpoints::default())
    }

    pub fn with_endpoints(config: GoogleConfig, endpoints: GoogleEndpoints) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            config,
            endpoints,
            client,
        }
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String, GoogleError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .client
            .post(&self.endpoints.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Token exchange failed");
            return Err(GoogleError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))?;

        Ok(token.access_token)
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo, GoogleError> {
        let response = self
            .client
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Userinfo request failed");
            return Err(GoogleError::RequestFailed(format!(
                "userinfo returned HTTP {}",
                status
            )));
        }

        response
            .json::<UserInfo>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for GoogleService {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=online",
            self.endpoints.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, GoogleError> {
        let access_token = self.fetch_access_token(code).await?;
        let info = self.fetch_user_info(&access_token).await?;

        let subject_id = info
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(GoogleError::MissingField("sub"))?;
        let email = info
            .email
            .filter(|s| !s.is_empty())
            .ok_or(GoogleError::MissingField("email"))?;

        info!(provider_id = %subject_id, "Resolved Google identity from authorization code");

        Ok(ProviderIdentity {
            subject_id,
            email,
            display_name: info.name,
            avatar_url: info.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleConfig {
        GoogleConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_url: "http://localhost:8080/auth/google/callback".to_string(),
        }
    }

    fn service_for(server: &mockito::ServerGuard) -> GoogleService {
        GoogleService::with_endpoints(
            config(),
            GoogleEndpoints {
                auth_url: format!("{}/auth", server.url()),
                token_url: format!("{}/token", server.url()),
                userinfo_url: format!("{}/userinfo", server.url()),
            },
        )
    }

    #[test]
    fn test_get_authorization_url() {
        let service = GoogleService::new(config());
        let url = service.authorization_url("abc123");

        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=test-client-id"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=abc123"));
    }

    #[tokio::test]
    async fn test_exchange_code_returns_identity() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("code".into(), "the-code".into()),
                mockito::Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at-1","expires_in":3599,"token_type":"Bearer"}"#)
            .create_async()
            .await;
        let userinfo_mock = server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer at-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"sub":"g1","email":"a@b.com","name":"Ann","picture":"https://img.test/a.png"}"#,
            )
            .create_async()
            .await;

        let identity = service_for(&server).exchange_code("the-code").await.unwrap();

        assert_eq!(
            identity,
            ProviderIdentity {
                subject_id: "g1".to_string(),
                email: "a@b.com".to_string(),
                display_name: "Ann".to_string(),
                avatar_url: "https://img.test/a.png".to_string(),
            }
        );
        token_mock.assert_async().await;
        userinfo_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_code_rejected_by_provider() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let err = service_for(&server).exchange_code("bad").await.unwrap_err();
        assert!(matches!(err, GoogleError::OAuthFailed(_)));
    }

    #[tokio::test]
    async fn test_exchange_code_requires_subject() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at-1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/userinfo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"email":"a@b.com"}"#)
            .create_async()
            .await;

        let err = service_for(&server).exchange_code("code").await.unwrap_err();
        assert!(matches!(err, GoogleError::MissingField("sub")));
    }
}
