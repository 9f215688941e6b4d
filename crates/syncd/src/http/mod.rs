//! The axum webhook/introspection HTTP surface.

pub mod error;
pub mod handlers;
pub mod webhooks;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::app::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/version", get(handlers::version))
        .route("/handlers", get(handlers::list_handlers))
        .route("/handlers/:name", get(handlers::get_handler))
        .route("/webhooks/users", post(webhooks::post_user_webhook))
        .route("/webhooks/permissions", post(webhooks::post_permission_webhook))
        .with_state(state)
}
