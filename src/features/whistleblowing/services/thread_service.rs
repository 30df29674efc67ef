use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::UserDirectory;
use crate::features::whistleblowing::dtos::{
    AnonymousThreadDto, MessageDto, PostMessageDto, ReporterCaseDetailDto,
    ReporterCaseSummaryDto,
};
use crate::features::whistleblowing::models::{
    ActorRole, Case, NewAuditEntry, NewMessage, SenderRole,
};
use crate::features::whistleblowing::repository::CaseStore;
use crate::features::whistleblowing::services::{
    content, notices, CaseAccess, ManagerResolver, WbSettings,
};
use crate::modules::crypto::CaseCipher;
use crate::modules::notifier::NotificationDispatcher;
use crate::shared::clock::Clock;
use crate::shared::constants::{AUDIT_MESSAGE_SENT, MAX_BODY_LENGTH};
use crate::shared::validation::require_text;

/// Append-only message threads for reporters and the case manager
pub struct ThreadService {
    store: Arc<dyn CaseStore>,
    cipher: Arc<CaseCipher>,
    access: Arc<CaseAccess>,
    users: Arc<dyn UserDirectory>,
    notifications: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    settings: Arc<WbSettings>,
}

impl ThreadService {
    pub fn new(
        store: Arc<dyn CaseStore>,
        cipher: Arc<CaseCipher>,
        access: Arc<CaseAccess>,
        users: Arc<dyn UserDirectory>,
        notifications: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        settings: Arc<WbSettings>,
    ) -> Self {
        Self {
            store,
            cipher,
            access,
            users,
            notifications,
            clock,
            settings,
        }
    }

    // -------------------------------------------------------------------------
    // Anonymous reporter
    // -------------------------------------------------------------------------

    pub async fn get_anonymous_thread(
        &self,
        protocol: &str,
        reply_token: &str,
    ) -> Result<AnonymousThreadDto> {
        let case = self.access.anonymous_case(protocol, reply_token).await?;
        let description = content::open_description(&self.cipher, &case)?;
        let messages = self.thread(case.id).await?;

        Ok(AnonymousThreadDto {
            protocol: case.protocol_code,
            title: case.title,
            status: case.status,
            description,
            created_at: case.created_at,
            last_update: case.last_update,
            messages,
        })
    }

    pub async fn post_anonymous_message(
        &self,
        protocol: &str,
        reply_token: &str,
        dto: PostMessageDto,
    ) -> Result<MessageDto> {
        let case = self.access.anonymous_case(protocol, reply_token).await?;
        let message = self.append(&case, SenderRole::Reporter, &dto.body).await?;
        self.notify_manager(&case).await;
        Ok(message)
    }

    // -------------------------------------------------------------------------
    // Identified reporter
    // -------------------------------------------------------------------------

    pub async fn list_reporter_cases(
        &self,
        actor: &AuthenticatedUser,
    ) -> Result<Vec<ReporterCaseSummaryDto>> {
        let cases = self.store.list_reporter_cases(&actor.sub).await?;
        Ok(cases.into_iter().map(Into::into).collect())
    }

    pub async fn get_reporter_case(
        &self,
        actor: &AuthenticatedUser,
        case_id: Uuid,
    ) -> Result<ReporterCaseDetailDto> {
        let case = self.access.reporter_case(actor, case_id).await?;
        let description = content::open_description(&self.cipher, &case)?;
        let messages = self.thread(case.id).await?;
        let category_id = case.category_id;

        Ok(ReporterCaseDetailDto {
            case: case.into(),
            description,
            category_id,
            messages,
        })
    }

    pub async fn post_reporter_message(
        &self,
        actor: &AuthenticatedUser,
        case_id: Uuid,
        dto: PostMessageDto,
    ) -> Result<MessageDto> {
        let case = self.access.reporter_case(actor, case_id).await?;
        let message = self.append(&case, SenderRole::Reporter, &dto.body).await?;
        self.notify_manager(&case).await;
        Ok(message)
    }

    // -------------------------------------------------------------------------
    // Case manager
    // -------------------------------------------------------------------------

    /// Post a manager reply. `first_response_at` keeps the earliest reply time.
    pub async fn post_manager_message(
        &self,
        actor: &AuthenticatedUser,
        case_id: Uuid,
        dto: PostMessageDto,
    ) -> Result<MessageDto> {
        let case = self.access.manager_case(actor, case_id).await?;
        let message = self.append(&case, SenderRole::Manager, &dto.body).await?;
        self.notify_reporter(&case).await;
        Ok(message)
    }

    async fn thread(&self, case_id: Uuid) -> Result<Vec<MessageDto>> {
        let messages = self.store.list_messages(case_id).await?;
        content::open_messages(&self.cipher, messages)
    }

    async fn append(&self, case: &Case, sender_role: SenderRole, body: &str) -> Result<MessageDto> {
        let body = require_text(body, "body", MAX_BODY_LENGTH)?;
        let now = self.clock.now();

        let message = self
            .store
            .insert_message(&NewMessage {
                case_id: case.id,
                sender_role,
                body_enc: content::seal_message(&self.cipher, &body)?,
                created_at: now,
            })
            .await?;

        let actor_role = match sender_role {
            SenderRole::Manager => {
                self.store.record_first_response(case.id, now).await?;
                ActorRole::Manager
            }
            SenderRole::Reporter => {
                self.store.touch_case(case.id, now).await?;
                ActorRole::Reporter
            }
        };

        self.store
            .append_audit(
                &NewAuditEntry::new(case.id, actor_role, AUDIT_MESSAGE_SENT, now)
                    .with_metadata(serde_json::json!({ "message_id": message.id })),
            )
            .await?;

        info!(case_id = %case.id, message_id = %message.id, ?sender_role, "Message posted");

        Ok(MessageDto {
            id: message.id,
            sender_role,
            body,
            created_at: message.created_at,
        })
    }

    async fn notify_manager(&self, case: &Case) {
        match self.users.find_user(&case.manager_id).await {
            Ok(Some(manager)) => {
                let to = ManagerResolver::recipients(&manager, &self.settings.extra_recipients);
                self.notifications
                    .dispatch(notices::reporter_message(to, &case.protocol_code));
            }
            Ok(None) => warn!(case_id = %case.id, "Case manager not found; notification skipped"),
            Err(e) => warn!(case_id = %case.id, "Could not look up case manager: {}", e),
        }
    }

    async fn notify_reporter(&self, case: &Case) {
        let Some(reporter_id) = case.reporter_user_id.as_deref() else {
            return;
        };
        match self.users.find_user(reporter_id).await {
            Ok(Some(reporter)) => {
                let to: Vec<String> = reporter.email.into_iter().collect();
                self.notifications
                    .dispatch(notices::manager_reply(to, &case.protocol_code));
            }
            Ok(None) => {}
            Err(e) => warn!(case_id = %case.id, "Could not look up reporter: {}", e),
        }
    }
}
