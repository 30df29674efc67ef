//! Resolves which case a caller may act on.
//!
//! Every failure mode is deliberately coarse: anonymous callers get one
//! generic auth error, identified reporters get `NotFound` for cases they do
//! not own, and managers only see cases assigned to the resolved manager.

use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::{authorize, model::AuthenticatedUser};
use crate::features::users::DirectoryUser;
use crate::features::whistleblowing::models::Case;
use crate::features::whistleblowing::repository::CaseStore;
use crate::features::whistleblowing::services::ManagerResolver;
use crate::modules::crypto::tokens::hash_token;
use crate::shared::clock::Clock;
use crate::shared::validation::normalize_protocol;

const INVALID_REPLY_CREDENTIALS: &str = "Invalid protocol or reply token";

pub struct CaseAccess {
    store: Arc<dyn CaseStore>,
    managers: Arc<ManagerResolver>,
    clock: Arc<dyn Clock>,
}

impl CaseAccess {
    pub fn new(
        store: Arc<dyn CaseStore>,
        managers: Arc<ManagerResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            managers,
            clock,
        }
    }

    /// Case addressed by protocol code and unlocked by a valid reply token
    pub async fn anonymous_case(&self, protocol: &str, raw_token: &str) -> Result<Case> {
        let denied = || AppError::Auth(INVALID_REPLY_CREDENTIALS.to_string());

        let code = normalize_protocol(protocol).ok_or_else(denied)?;
        let case = self
            .store
            .find_case_by_protocol(&code)
            .await?
            .ok_or_else(denied)?;

        let valid = self
            .store
            .has_valid_reply_token(case.id, &hash_token(raw_token), self.clock.now())
            .await?;
        if !valid {
            tracing::info!(case_id = %case.id, "Rejected reply token");
            return Err(denied());
        }

        Ok(case)
    }

    /// Identified case owned by the calling reporter
    pub async fn reporter_case(&self, actor: &AuthenticatedUser, case_id: Uuid) -> Result<Case> {
        self.store
            .find_case(case_id)
            .await?
            .filter(|c| !c.is_anonymous && c.reporter_user_id.as_deref() == Some(actor.sub.as_str()))
            .ok_or_else(|| AppError::NotFound("Report not found".to_string()))
    }

    /// Authorize the actor as case manager and resolve the manager identity
    pub async fn manager(&self, actor: &AuthenticatedUser) -> Result<DirectoryUser> {
        authorize(actor, self.managers.role())?;
        self.managers.resolve().await
    }

    /// Case assigned to the resolved manager
    pub async fn manager_case(&self, actor: &AuthenticatedUser, case_id: Uuid) -> Result<Case> {
        let manager = self.manager(actor).await?;
        self.store
            .find_case(case_id)
            .await?
            .filter(|c| c.manager_id == manager.id)
            .ok_or_else(|| AppError::NotFound("Case not found".to_string()))
    }
}
