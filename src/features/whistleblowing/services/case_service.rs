use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::categories::CategoryCatalog;
use crate::features::users::UserDirectory;
use crate::features::whistleblowing::dtos::{
    AuditEntryDto, CaseListQuery, ManagerCaseDetailDto, ManagerCaseSummaryDto,
    ReporterIdentityDto, UpdateCaseDto,
};
use crate::features::whistleblowing::models::{ActorRole, Case, CaseChanges, NewAuditEntry};
use crate::features::whistleblowing::repository::CaseStore;
use crate::features::whistleblowing::services::{content, CaseAccess};
use crate::modules::crypto::CaseCipher;
use crate::shared::clock::Clock;
use crate::shared::constants::{AUDIT_REPORT_UPDATED, AUDIT_VIEWED, MANAGER_CASE_PAGE_SIZE};
use crate::shared::validation::normalize_protocol;

/// Case manager operations: triage, status changes and the audit trail
pub struct CaseService {
    store: Arc<dyn CaseStore>,
    cipher: Arc<CaseCipher>,
    access: Arc<CaseAccess>,
    users: Arc<dyn UserDirectory>,
    categories: Arc<dyn CategoryCatalog>,
    clock: Arc<dyn Clock>,
}

impl CaseService {
    pub fn new(
        store: Arc<dyn CaseStore>,
        cipher: Arc<CaseCipher>,
        access: Arc<CaseAccess>,
        users: Arc<dyn UserDirectory>,
        categories: Arc<dyn CategoryCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cipher,
            access,
            users,
            categories,
            clock,
        }
    }

    /// Cases assigned to the manager, most recently updated first
    pub async fn list_cases(
        &self,
        actor: &AuthenticatedUser,
        query: CaseListQuery,
    ) -> Result<Vec<ManagerCaseSummaryDto>> {
        let manager = self.access.manager(actor).await?;
        let cases = self
            .store
            .list_manager_cases(&manager.id, &query.into(), MANAGER_CASE_PAGE_SIZE)
            .await?;
        Ok(cases.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_protocol(
        &self,
        actor: &AuthenticatedUser,
        protocol: &str,
    ) -> Result<ManagerCaseSummaryDto> {
        let manager = self.access.manager(actor).await?;
        let not_found = || AppError::NotFound("Case not found".to_string());

        let code = normalize_protocol(protocol).ok_or_else(not_found)?;
        self.store
            .find_case_by_protocol(&code)
            .await?
            .filter(|c| c.manager_id == manager.id)
            .map(Into::into)
            .ok_or_else(not_found)
    }

    /// Full case view. Every call is audited as `VIEWED`.
    pub async fn get_case_detail(
        &self,
        actor: &AuthenticatedUser,
        case_id: Uuid,
    ) -> Result<ManagerCaseDetailDto> {
        let case = self.access.manager_case(actor, case_id).await?;

        let description = content::open_description(&self.cipher, &case)?;
        let messages = content::open_messages(&self.cipher, self.store.list_messages(case.id).await?)?;
        let attachments = self
            .store
            .list_attachments(case.id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let reporter = self.reporter_identity(&case).await?;

        self.store
            .append_audit(&NewAuditEntry::new(
                case.id,
                ActorRole::Manager,
                AUDIT_VIEWED,
                self.clock.now(),
            ))
            .await?;

        Ok(ManagerCaseDetailDto {
            case: case.into(),
            description,
            reporter,
            messages,
            attachments,
        })
    }

    /// Apply a partial update. An empty change set writes nothing.
    pub async fn update_case(
        &self,
        actor: &AuthenticatedUser,
        case_id: Uuid,
        dto: UpdateCaseDto,
    ) -> Result<ManagerCaseSummaryDto> {
        let case = self.access.manager_case(actor, case_id).await?;
        let changes = CaseChanges::from(dto);

        if changes.is_empty() {
            return Ok(case.into());
        }

        if let Some(category_id) = changes.category_id {
            if !self.categories.is_active_category(category_id).await? {
                return Err(AppError::Validation(
                    "Category is unknown or inactive".to_string(),
                ));
            }
        }

        let now = self.clock.now();
        let updated = self
            .store
            .apply_changes(case.id, &changes, now)
            .await?
            .ok_or_else(|| AppError::NotFound("Case not found".to_string()))?;

        self.store
            .append_audit(
                &NewAuditEntry::new(case.id, ActorRole::Manager, AUDIT_REPORT_UPDATED, now)
                    .with_metadata(json!({
                        "status": changes.status,
                        "previous_status": case.status,
                        "category_id": changes.category_id,
                        "acknowledge": changes.acknowledge,
                    })),
            )
            .await?;

        info!(
            case_id = %updated.id,
            status = %updated.status,
            closed = updated.status.is_closed(),
            "Case updated"
        );
        Ok(updated.into())
    }

    /// Audit trail, oldest first
    pub async fn list_audit(
        &self,
        actor: &AuthenticatedUser,
        case_id: Uuid,
    ) -> Result<Vec<AuditEntryDto>> {
        let case = self.access.manager_case(actor, case_id).await?;
        let entries = self.store.list_audit(case.id).await?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    async fn reporter_identity(&self, case: &Case) -> Result<Option<ReporterIdentityDto>> {
        if case.is_anonymous {
            return Ok(None);
        }
        let Some(user_id) = case.reporter_user_id.as_deref() else {
            return Ok(None);
        };

        let user = self.users.find_user(user_id).await?;
        if user.is_none() {
            warn!(case_id = %case.id, "Reporter no longer in user directory");
        }

        Ok(Some(ReporterIdentityDto {
            user_id: user_id.to_string(),
            display_name: user.as_ref().and_then(|u| u.display_name.clone()),
            email: user.and_then(|u| u.email),
        }))
    }
}
