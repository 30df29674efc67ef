use crate::features::auth::handler;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Protected auth routes (require JWT authentication)
pub fn protected_routes(manager_role: Arc<String>) -> Router {
    Router::new()
        .route("/api/auth/me", get(handler::get_me))
        .with_state(manager_role)
}
