// src/common/config.rs
//! Process configuration loaded once at startup

use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000/app";
const DEFAULT_DATABASE_URL: &str = "sqlite://gochi.db";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_TODOS_TABLE: &str = "todos";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Which persistence engine backs the user and todo stores
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Sqlite {
        database_url: String,
    },
    DynamoDb {
        region: String,
        users_table: String,
        todos_table: String,
    },
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub secure: bool,
    pub http_only: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub google: GoogleConfig,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
    pub cookie: CookieConfig,
    pub store: StoreBackend,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let google = GoogleConfig {
            client_id: require("GOOGLE_CLIENT_ID")?,
            client_secret: require("GOOGLE_CLIENT_SECRET")?,
            redirect_url: require("GOOGLE_REDIRECT_URL")?,
        };

        let jwt_secret = require("JWT_SECRET")?;

        let frontend_url = get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());

        let port = match get("PORT") {
            Some(p) => p.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: p,
            })?,
            None => 8080,
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "REQUEST_TIMEOUT_SECS",
                        value: v,
                    })
                }
            },
            None => Duration::from_secs(30),
        };

        let cookie = CookieConfig {
            secure: parse_bool(get("SESSION_COOKIE_SECURE"), "SESSION_COOKIE_SECURE", false)?,
            http_only: parse_bool(
                get("SESSION_COOKIE_HTTP_ONLY"),
                "SESSION_COOKIE_HTTP_ONLY",
                true,
            )?,
        };

        let store = match get("STORE_BACKEND").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("sqlite") => StoreBackend::Sqlite {
                database_url: get("DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            },
            Some("dynamodb") | Some("dynamo") => StoreBackend::DynamoDb {
                region: require("AWS_REGION")?,
                users_table: require("USERS_TABLE")?,
                todos_table: get("TODOS_TABLE").unwrap_or_else(|| DEFAULT_TODOS_TABLE.to_string()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            google,
            jwt_secret,
            frontend_url,
            port,
            cors_origins,
            request_timeout,
            cookie,
            store,
        })
    }
}

fn parse_bool(value: Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match value.map(|v| v.to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: v }),
        },
    }
}
