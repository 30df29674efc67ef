use sqlx::FromRow;
use uuid::Uuid;

/// Row of the platform `categories` table as offered to reporters
#[derive(Debug, Clone, FromRow)]
pub struct ReportCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i32,
}
