// src/todos/routes.rs

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use super::handlers;
use crate::auth::require_session;

/// Todo routes; all of them sit behind the session gate
pub fn todos_routes() -> Router {
    Router::new()
        .route(
            "/api/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/api/todos/:id",
            patch(handlers::update_todo).delete(handlers::delete_todo),
        )
        .route_layer(middleware::from_fn(require_session))
}
