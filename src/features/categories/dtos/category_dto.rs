use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::categories::models::ReportCategory;

/// Category a reporter may file under
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportCategoryDto {
    pub id: Uuid,
    #[schema(example = "Health and safety")]
    pub name: String,
    #[schema(example = "health-and-safety")]
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i32,
}

impl From<ReportCategory> for ReportCategoryDto {
    fn from(row: ReportCategory) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            display_order: row.display_order,
        }
    }
}
