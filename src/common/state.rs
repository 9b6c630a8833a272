// Application state shared across all modules

use std::sync::Arc;

use crate::auth::token::TokenCodec;
use crate::common::config::CookieConfig;
use crate::services::{IdentityProvider, TodoStore, UserStore};

/// Immutable after startup; shared as `Extension<Arc<AppState>>`.
/// All cross-request state lives in the client's token or the store.
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenCodec,
    pub identity: Arc<dyn IdentityProvider>,
    pub users: UserStore,
    pub todos: TodoStore,
    /// Source of ids for newly created todos
    pub new_todo_id: fn() -> String,
    pub frontend_url: String,
    pub cookie: CookieConfig,
}
