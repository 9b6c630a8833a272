// Shared fixtures for router-level tests

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::auth::session::SESSION_COOKIE;
use crate::auth::token::{session_ttl, TokenCodec};
use crate::common::config::CookieConfig;
use crate::common::{generate_todo_id, AppState};
use crate::services::google::{GoogleError, ProviderIdentity};
use crate::services::{IdentityProvider, TodoStore, UserStore};
use crate::store::sqlite::tests::memory_engine;
use crate::store::{Engine, Item, Key, SqliteEngine, StoreError, Table};

pub const TEST_SECRET: &str = "test_secret_key";
pub const TEST_FRONTEND: &str = "http://localhost:3000/app";

/// Identity provider that accepts a single code and counts exchanges.
/// With a `delay`, every exchange sleeps that long before answering.
pub struct FakeIdentity {
    pub valid_code: &'static str,
    pub identity: ProviderIdentity,
    pub delay: Option<Duration>,
    pub exchanges: AtomicUsize,
}

impl FakeIdentity {
    pub fn new(valid_code: &'static str, identity: ProviderIdentity) -> Self {
        Self {
            valid_code,
            identity,
            delay: None,
            exchanges: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://accounts.example.test/auth?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderIdentity, GoogleError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if code == self.valid_code {
            Ok(self.identity.clone())
        } else {
            Err(GoogleError::OAuthFailed("invalid_grant".to_string()))
        }
    }
}

/// Engine wrapper that counts every call reaching the store
pub struct CountingEngine<E> {
    inner: E,
    pub calls: AtomicUsize,
}

impl<E> CountingEngine<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<E: Engine> Engine for CountingEngine<E> {
    async fn get_item(&self, table: &Table, key: &Key) -> Result<Option<Item>, StoreError> {
        self.tick();
        self.inner.get_item(table, key).await
    }

    async fn put_item(&self, table: &Table, item: Item) -> Result<(), StoreError> {
        self.tick();
        self.inner.put_item(table, item).await
    }

    async fn put_item_if_absent(&self, table: &Table, item: Item) -> Result<(), StoreError> {
        self.tick();
        self.inner.put_item_if_absent(table, item).await
    }

    async fn update_item(&self, table: &Table, key: &Key, changes: Item) -> Result<(), StoreError> {
        self.tick();
        self.inner.update_item(table, key, changes).await
    }

    async fn delete_item(&self, table: &Table, key: &Key) -> Result<(), StoreError> {
        self.tick();
        self.inner.delete_item(table, key).await
    }

    async fn query_partition(&self, table: &Table, partition: &str) -> Result<Vec<Item>, StoreError> {
        self.tick();
        self.inner.query_partition(table, partition).await
    }
}

pub fn google_identity() -> ProviderIdentity {
    ProviderIdentity {
        subject_id: "g1".to_string(),
        email: "a@x.com".to_string(),
        display_name: "Ada".to_string(),
        avatar_url: "https://example.test/ada.png".to_string(),
    }
}

pub struct TestOptions {
    pub request_timeout: Duration,
    pub provider_delay: Option<Duration>,
    pub new_todo_id: fn() -> String,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            provider_delay: None,
            new_todo_id: generate_todo_id,
        }
    }
}

/// Full application router over an in-memory store
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub identity: Arc<FakeIdentity>,
    pub engine: Arc<CountingEngine<SqliteEngine>>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let engine = Arc::new(CountingEngine::new(memory_engine().await));
        let mut identity = FakeIdentity::new("good-code", google_identity());
        identity.delay = options.provider_delay;
        let identity = Arc::new(identity);

        let state = Arc::new(AppState {
            tokens: TokenCodec::new(TEST_SECRET),
            identity: identity.clone(),
            users: UserStore::new(engine.clone(), "users"),
            todos: TodoStore::new(engine.clone(), "todos"),
            new_todo_id: options.new_todo_id,
            frontend_url: TEST_FRONTEND.to_string(),
            cookie: CookieConfig {
                secure: false,
                http_only: true,
            },
        });

        Self {
            router: crate::app(state.clone(), options.request_timeout),
            state,
            identity,
            engine,
        }
    }

    pub fn engine_calls(&self) -> usize {
        self.engine.calls.load(Ordering::SeqCst)
    }

    pub fn provider_calls(&self) -> usize {
        self.identity.exchanges.load(Ordering::SeqCst)
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// `Cookie` header value for a freshly issued session
    pub fn session_for(&self, user_id: &str, email: &str) -> String {
        let token = self
            .state
            .tokens
            .issue(user_id, email, session_ttl())
            .unwrap();
        format!("{SESSION_COOKIE}={token}")
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    request("GET", uri, cookie, Body::empty())
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(body).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
