use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::ReportCategoryDto;
use crate::features::categories::models::ReportCategory;

/// Read access to report categories
#[async_trait]
pub trait CategoryCatalog: Send + Sync {
    async fn list_active(&self) -> Result<Vec<ReportCategoryDto>>;

    async fn is_active_category(&self, id: Uuid) -> Result<bool>;
}

/// Postgres-backed [`CategoryCatalog`]
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryCatalog for CategoryService {
    async fn list_active(&self) -> Result<Vec<ReportCategoryDto>> {
        let categories = sqlx::query_as::<_, ReportCategory>(
            r#"
            SELECT id, name, slug, description, display_order
            FROM categories
            WHERE is_active = TRUE
            ORDER BY display_order, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list categories: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(categories.into_iter().map(ReportCategoryDto::from).collect())
    }

    async fn is_active_category(&self, id: Uuid) -> Result<bool> {
        let found: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM categories WHERE id = $1 AND is_active = TRUE")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to check category: {:?}", e);
                    AppError::Database(e)
                })?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
pub use fixed::StaticCategoryCatalog;

#[cfg(test)]
mod fixed {
    use super::*;

    /// Catalog with a fixed set of active category ids
    #[derive(Default)]
    pub struct StaticCategoryCatalog {
        pub active: Vec<Uuid>,
    }

    impl StaticCategoryCatalog {
        pub fn with_active(ids: &[Uuid]) -> Self {
            Self {
                active: ids.to_vec(),
            }
        }
    }

    #[async_trait]
    impl CategoryCatalog for StaticCategoryCatalog {
        async fn list_active(&self) -> Result<Vec<ReportCategoryDto>> {
            Ok(self
                .active
                .iter()
                .enumerate()
                .map(|(i, id)| ReportCategoryDto {
                    id: *id,
                    name: format!("Category {}", i + 1),
                    slug: format!("category-{}", i + 1),
                    description: None,
                    display_order: i as i32,
                })
                .collect())
        }

        async fn is_active_category(&self, id: Uuid) -> Result<bool> {
            Ok(self.active.contains(&id))
        }
    }
}
