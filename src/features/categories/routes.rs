use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryCatalog;

/// Create routes for the categories feature
///
/// Note: This feature is public (no authentication required)
pub fn routes(catalog: Arc<dyn CategoryCatalog>) -> Router {
    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .with_state(catalog)
}
