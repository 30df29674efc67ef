use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::categories::CategoryCatalog;
use crate::features::users::DirectoryUser;
use crate::features::whistleblowing::dtos::{
    AnonymousReportCreatedDto, CreateReportDto, IdentifiedReportCreatedDto,
};
use crate::features::whistleblowing::models::{Case, IssuedReplyToken, NewCase};
use crate::features::whistleblowing::repository::CaseStore;
use crate::features::whistleblowing::services::{content, notices, ManagerResolver, WbSettings};
use crate::modules::crypto::tokens::{generate_protocol_code, generate_reply_token, hash_token};
use crate::modules::crypto::CaseCipher;
use crate::modules::notifier::NotificationDispatcher;
use crate::shared::clock::Clock;
use crate::shared::constants::{MAX_BODY_LENGTH, MAX_PROTOCOL_ATTEMPTS, MAX_TITLE_LENGTH};
use crate::shared::validation::require_text;

const MAX_POLICY_VERSION_LENGTH: usize = 32;

/// Report fields after validation
struct ValidatedReport {
    title: String,
    description: String,
    category_id: Option<Uuid>,
    policy_version: String,
}

/// Creates new whistleblowing cases
pub struct IntakeService {
    store: Arc<dyn CaseStore>,
    cipher: Arc<CaseCipher>,
    managers: Arc<ManagerResolver>,
    categories: Arc<dyn CategoryCatalog>,
    notifications: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    settings: Arc<WbSettings>,
}

impl IntakeService {
    pub fn new(
        store: Arc<dyn CaseStore>,
        cipher: Arc<CaseCipher>,
        managers: Arc<ManagerResolver>,
        categories: Arc<dyn CategoryCatalog>,
        notifications: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        settings: Arc<WbSettings>,
    ) -> Self {
        Self {
            store,
            cipher,
            managers,
            categories,
            notifications,
            clock,
            settings,
        }
    }

    /// File an anonymous report and issue its reply token
    pub async fn create_anonymous_report(
        &self,
        dto: CreateReportDto,
    ) -> Result<AnonymousReportCreatedDto> {
        let report = self.validate(&dto).await?;
        let manager = self.managers.resolve().await?;
        let now = self.clock.now();

        let reply_token = generate_reply_token();
        let expires_at = now + self.settings.reply_token_ttl;
        let issued = IssuedReplyToken {
            token_hash: hash_token(&reply_token),
            expires_at,
        };

        let case = self
            .insert_case(&report, &manager, None, Some(issued), now)
            .await?;

        info!(case_id = %case.id, protocol = %case.protocol_code, "Anonymous report created");
        self.notify_manager(&manager, &case.protocol_code);

        Ok(AnonymousReportCreatedDto {
            protocol: case.protocol_code,
            reply_token,
            reply_token_expires_at: expires_at,
        })
    }

    /// File a report on behalf of an authenticated reporter
    pub async fn create_identified_report(
        &self,
        actor: &AuthenticatedUser,
        dto: CreateReportDto,
    ) -> Result<IdentifiedReportCreatedDto> {
        if actor.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("Authentication required".to_string()));
        }

        let report = self.validate(&dto).await?;
        let manager = self.managers.resolve().await?;
        let now = self.clock.now();

        let case = self
            .insert_case(&report, &manager, Some(actor.sub.clone()), None, now)
            .await?;

        info!(case_id = %case.id, protocol = %case.protocol_code, "Identified report created");
        self.notify_manager(&manager, &case.protocol_code);

        Ok(IdentifiedReportCreatedDto {
            report_id: case.id,
            protocol: case.protocol_code,
        })
    }

    async fn validate(&self, dto: &CreateReportDto) -> Result<ValidatedReport> {
        if !dto.policy_accepted {
            return Err(AppError::Validation(
                "The whistleblowing policy must be accepted".to_string(),
            ));
        }

        let title = require_text(&dto.title, "title", MAX_TITLE_LENGTH)?;
        let description = require_text(&dto.description, "description", MAX_BODY_LENGTH)?;

        let category_id = match dto.parsed_category_id()? {
            Some(id) if self.categories.is_active_category(id).await? => Some(id),
            Some(id) => {
                debug!(category_id = %id, "Ignoring unknown or inactive category");
                None
            }
            None => None,
        };

        let policy_version = dto
            .policy_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.chars().take(MAX_POLICY_VERSION_LENGTH).collect())
            .unwrap_or_else(|| self.settings.default_policy_version.clone());

        Ok(ValidatedReport {
            title,
            description,
            category_id,
            policy_version,
        })
    }

    /// Insert the case, drawing a fresh protocol code on each collision.
    /// Anonymous reports carry their reply token and are acknowledged on receipt.
    async fn insert_case(
        &self,
        report: &ValidatedReport,
        manager: &DirectoryUser,
        reporter_user_id: Option<String>,
        reply_token: Option<IssuedReplyToken>,
        now: DateTime<Utc>,
    ) -> Result<Case> {
        let description_enc = content::seal_description(&self.cipher, &report.description)?;

        let mut attempt = 1;
        loop {
            let data = NewCase {
                protocol_code: generate_protocol_code(now),
                title: report.title.clone(),
                description_enc: description_enc.clone(),
                is_anonymous: reporter_user_id.is_none(),
                reporter_user_id: reporter_user_id.clone(),
                manager_id: manager.id.clone(),
                category_id: report.category_id,
                policy_accepted: true,
                policy_version: report.policy_version.clone(),
                acknowledged_at: reply_token.as_ref().map(|_| now),
                created_at: now,
                reply_token: reply_token.clone(),
            };

            match self.store.insert_case(&data).await {
                Err(AppError::Conflict(_)) if attempt < MAX_PROTOCOL_ATTEMPTS => {
                    warn!(attempt, "Protocol code collision, drawing a new code");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn notify_manager(&self, manager: &DirectoryUser, protocol: &str) {
        let to = ManagerResolver::recipients(manager, &self.settings.extra_recipients);
        self.notifications
            .dispatch(notices::new_report(to, protocol));
    }
}
