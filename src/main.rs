// src/main.rs
use axum::{
    extract::Extension,
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use dotenv::dotenv;
use std::path::PathBuf;
use std::time::Duration;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod auth;
mod common;
mod logging_middleware;
mod services;
mod store;
mod todos;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use auth::token::TokenCodec;
use common::config::StoreBackend;
use common::{generate_todo_id, AppConfig, AppState};
use services::{GoogleService, TodoStore, UserStore};
use store::{DynamoEngine, Engine, SqliteEngine};

const SQLITE_USERS_TABLE: &str = "users";
const SQLITE_TODOS_TABLE: &str = "todos";

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = AppConfig::from_env()?;
    info!(
        port = config.port,
        frontend_url = %config.frontend_url,
        cookie_secure = config.cookie.secure,
        "Configuration loaded"
    );
    if !config.cookie.secure {
        warn!("Session cookie is not marked Secure; only use this over plain HTTP in development");
    }

    // ========================================================================
    // STORE SETUP
    // ========================================================================

    let (engine, users_table, todos_table): (Arc<dyn Engine>, String, String) =
        match &config.store {
            StoreBackend::Sqlite { database_url } => {
                ensure_sqlite_parent_dir(database_url).await?;
                let engine: Arc<dyn Engine> = Arc::new(SqliteEngine::connect(database_url).await?);
                info!(database_url = %database_url, "SQLite store ready");
                (
                    engine,
                    SQLITE_USERS_TABLE.to_string(),
                    SQLITE_TODOS_TABLE.to_string(),
                )
            }
            StoreBackend::DynamoDb {
                region,
                users_table,
                todos_table,
            } => {
                let engine: Arc<dyn Engine> = Arc::new(DynamoEngine::connect(region).await);
                info!(
                    region = %region,
                    users_table = %users_table,
                    todos_table = %todos_table,
                    "DynamoDB store ready"
                );
                (engine, users_table.clone(), todos_table.clone())
            }
        };

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let google_service = Arc::new(GoogleService::new(config.google.clone()));
    info!("GoogleService initialized");

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let app_state = AppState {
        tokens: TokenCodec::new(&config.jwt_secret),
        identity: google_service,
        users: UserStore::new(engine.clone(), users_table),
        todos: TodoStore::new(engine, todos_table),
        new_todo_id: generate_todo_id,
        frontend_url: config.frontend_url.clone(),
        cookie: config.cookie.clone(),
    };

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = app(Arc::new(app_state), config.request_timeout)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Routes plus the layers every request needs to reach a handler.
/// A request still running at `request_timeout` is answered with 408 and its
/// handler future is dropped, which cancels any provider or store call in it.
fn app(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        // ====================================================================
        // AUTHENTICATION ROUTES
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // TODO ROUTES
        // ====================================================================
        .merge(todos::todos_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request))
        .layer(Extension(state))
        .layer(TimeoutLayer::new(request_timeout))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// SQLite creates the database file but not its directory
async fn ensure_sqlite_parent_dir(database_url: &str) -> std::io::Result<()> {
    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }
    Ok(())
}
