use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::users::models::DirectoryUser;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// First active user holding `role`, if any
    async fn find_active_user_with_role(&self, role: &str) -> Result<Option<DirectoryUser>>;

    async fn find_user(&self, id: &str) -> Result<Option<DirectoryUser>>;
}

/// Reads the platform `users` table
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_active_user_with_role(&self, role: &str) -> Result<Option<DirectoryUser>> {
        sqlx::query_as::<_, DirectoryUser>(
            r#"
            SELECT id, email, display_name
            FROM users
            WHERE is_active = TRUE AND $1 = ANY(roles)
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user by role: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_user(&self, id: &str) -> Result<Option<DirectoryUser>> {
        sqlx::query_as::<_, DirectoryUser>(
            "SELECT id, email, display_name FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user: {:?}", e);
            AppError::Database(e)
        })
    }
}

#[cfg(test)]
pub use fixed::StaticUserDirectory;

#[cfg(test)]
mod fixed {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Directory backed by a fixed list of `(user, roles)` pairs
    #[derive(Default)]
    pub struct StaticUserDirectory {
        users: Mutex<Vec<(DirectoryUser, Vec<String>)>>,
        role_lookups: AtomicUsize,
    }

    impl StaticUserDirectory {
        pub fn with_user(self, user: DirectoryUser, roles: &[&str]) -> Self {
            self.users
                .lock()
                .unwrap()
                .push((user, roles.iter().map(|r| r.to_string()).collect()));
            self
        }

        pub fn clear(&self) {
            self.users.lock().unwrap().clear();
        }

        /// Number of role lookups served
        pub fn role_lookups(&self) -> usize {
            self.role_lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserDirectory for StaticUserDirectory {
        async fn find_active_user_with_role(&self, role: &str) -> Result<Option<DirectoryUser>> {
            self.role_lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|(_, roles)| roles.iter().any(|r| r == role))
                .map(|(u, _)| u.clone()))
        }

        async fn find_user(&self, id: &str) -> Result<Option<DirectoryUser>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|(u, _)| u.id == id)
                .map(|(u, _)| u.clone()))
        }
    }
}
