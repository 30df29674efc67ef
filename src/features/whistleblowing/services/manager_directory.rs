use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};
use crate::features::users::{DirectoryUser, UserDirectory};
use crate::shared::clock::Clock;

struct CachedManager {
    user: DirectoryUser,
    fetched_at: DateTime<Utc>,
}

/// Resolves the active whistleblowing case manager, caching the answer for a
/// short TTL. Reads within the TTL may be stale.
pub struct ManagerResolver {
    users: Arc<dyn UserDirectory>,
    role: String,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    cache: RwLock<Option<CachedManager>>,
}

impl ManagerResolver {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        role: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            role: role.into(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
            clock,
            cache: RwLock::new(None),
        }
    }

    /// Role name that identifies the case manager
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Current case manager, or `AppError::Configuration` when none is provisioned
    pub async fn resolve(&self) -> Result<DirectoryUser> {
        let now = self.clock.now();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if now - cached.fetched_at < self.ttl {
                    return Ok(cached.user.clone());
                }
            }
        }

        let user = self
            .users
            .find_active_user_with_role(&self.role)
            .await?
            .ok_or_else(|| {
                tracing::error!(role = %self.role, "No active user holds the case manager role");
                AppError::Configuration(format!(
                    "No active user with role '{}' is configured",
                    self.role
                ))
            })?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedManager {
            user: user.clone(),
            fetched_at: now,
        });

        Ok(user)
    }

    /// Notification addresses: the manager's email plus any configured extras
    pub fn recipients(manager: &DirectoryUser, extra: &[String]) -> Vec<String> {
        let mut to: Vec<String> = manager.email.iter().cloned().collect();
        for addr in extra {
            if !to.contains(addr) {
                to.push(addr.clone());
            }
        }
        to
    }
}
