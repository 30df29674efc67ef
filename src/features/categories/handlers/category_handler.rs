use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::features::categories::dtos::ReportCategoryDto;
use crate::features::categories::services::CategoryCatalog;
use crate::shared::types::{ApiResponse, Meta};

/// List all active report categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<ReportCategoryDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(catalog): State<Arc<dyn CategoryCatalog>>,
) -> Result<Json<ApiResponse<Vec<ReportCategoryDto>>>> {
    let categories = catalog.list_active().await?;
    let meta = Meta::total(categories.len());
    Ok(Json(ApiResponse::success(Some(categories), None, Some(meta))))
}
