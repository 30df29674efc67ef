use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::whistleblowing::models::{
    Attachment, AuditEntry, AvStatus, Case, CaseChanges, CaseFilter, Message, NewAttachment,
    NewAuditEntry, NewCase, NewMessage,
};

use super::CaseStore;

const CASE_COLUMNS: &str = r#"
    id, protocol_code, title, description_enc, is_anonymous, reporter_user_id, manager_id,
    category_id, status, policy_accepted, policy_version, created_at, acknowledged_at,
    first_response_at, closed_at, last_update
"#;

const ATTACHMENT_COLUMNS: &str = r#"
    id, case_id, original_filename, mime_type, size_bytes, content_hash, storage_key,
    av_status, created_at
"#;

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("{}: {:?}", context, e);
        AppError::Database(e)
    }
}

/// Postgres-backed case store
#[derive(Clone)]
pub struct PgCaseStore {
    pool: PgPool,
}

impl PgCaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaseStore for PgCaseStore {
    async fn insert_case(&self, data: &NewCase) -> Result<Case> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin case transaction"))?;

        let sql = format!(
            r#"
            INSERT INTO wb_cases (
                protocol_code, title, description_enc, is_anonymous, reporter_user_id,
                manager_id, category_id, status, policy_accepted, policy_version,
                created_at, acknowledged_at, last_update
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'submitted', $8, $9, $10, $11, $10)
            RETURNING {CASE_COLUMNS}
            "#
        );

        let case = sqlx::query_as::<_, Case>(&sql)
            .bind(&data.protocol_code)
            .bind(&data.title)
            .bind(&data.description_enc)
            .bind(data.is_anonymous)
            .bind(&data.reporter_user_id)
            .bind(&data.manager_id)
            .bind(data.category_id)
            .bind(data.policy_accepted)
            .bind(&data.policy_version)
            .bind(data.created_at)
            .bind(data.acknowledged_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Protocol code already in use".to_string())
                } else {
                    tracing::error!("Failed to insert case: {:?}", e);
                    AppError::Database(e)
                }
            })?;

        if let Some(token) = &data.reply_token {
            sqlx::query(
                r#"
                INSERT INTO wb_reply_tokens (case_id, token_hash, expires_at, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(case.id)
            .bind(&token.token_hash)
            .bind(token.expires_at)
            .bind(data.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to insert reply token"))?;
        }

        let audit = NewAuditEntry::case_created(&case);
        sqlx::query(
            r#"
            INSERT INTO wb_audit_entries (case_id, actor_role, action, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(audit.case_id)
        .bind(audit.actor_role)
        .bind(audit.action)
        .bind(&audit.metadata)
        .bind(audit.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to append creation audit entry"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit case transaction"))?;

        Ok(case)
    }

    async fn find_case(&self, id: Uuid) -> Result<Option<Case>> {
        let sql = format!("SELECT {CASE_COLUMNS} FROM wb_cases WHERE id = $1");
        sqlx::query_as::<_, Case>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch case"))
    }

    async fn find_case_by_protocol(&self, protocol_code: &str) -> Result<Option<Case>> {
        let sql = format!("SELECT {CASE_COLUMNS} FROM wb_cases WHERE protocol_code = $1");
        sqlx::query_as::<_, Case>(&sql)
            .bind(protocol_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch case by protocol"))
    }

    async fn list_manager_cases(
        &self,
        manager_id: &str,
        filter: &CaseFilter,
        limit: i64,
    ) -> Result<Vec<Case>> {
        let sql = format!(
            r#"
            SELECT {CASE_COLUMNS}
            FROM wb_cases
            WHERE manager_id = $1
              AND ($2::wb_case_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR protocol_code ILIKE $3 OR title ILIKE $3)
            ORDER BY last_update DESC
            LIMIT $4
            "#
        );

        let pattern = filter
            .search
            .as_deref()
            .map(|q| format!("%{}%", escape_like(q)));

        sqlx::query_as::<_, Case>(&sql)
            .bind(manager_id)
            .bind(filter.status)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list manager cases"))
    }

    async fn list_reporter_cases(&self, reporter_user_id: &str) -> Result<Vec<Case>> {
        let sql = format!(
            r#"
            SELECT {CASE_COLUMNS}
            FROM wb_cases
            WHERE reporter_user_id = $1 AND is_anonymous = FALSE
            ORDER BY created_at DESC
            "#
        );
        sqlx::query_as::<_, Case>(&sql)
            .bind(reporter_user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list reporter cases"))
    }

    async fn apply_changes(
        &self,
        id: Uuid,
        changes: &CaseChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Case>> {
        let sql = format!(
            r#"
            UPDATE wb_cases SET
                status = COALESCE($2, status),
                category_id = COALESCE($3, category_id),
                acknowledged_at = CASE
                    WHEN $4 THEN COALESCE(acknowledged_at, $5)
                    ELSE acknowledged_at
                END,
                closed_at = CASE
                    WHEN $2::wb_case_status IS NULL THEN closed_at
                    WHEN $2::wb_case_status IN
                        ('closed_substantiated', 'closed_unsubstantiated', 'closed_other')
                        THEN COALESCE(closed_at, $5)
                    ELSE NULL
                END,
                last_update = $5
            WHERE id = $1
            RETURNING {CASE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Case>(&sql)
            .bind(id)
            .bind(changes.status)
            .bind(changes.category_id)
            .bind(changes.acknowledge)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update case"))
    }

    async fn record_first_response(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE wb_cases
            SET first_response_at = LEAST(first_response_at, $2), last_update = GREATEST(last_update, $2)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to record first response"))?;
        Ok(())
    }

    async fn touch_case(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE wb_cases SET last_update = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to touch case"))?;
        Ok(())
    }

    async fn insert_message(&self, data: &NewMessage) -> Result<Message> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO wb_messages (case_id, sender_role, body_enc, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, case_id, sender_role, body_enc, created_at
            "#,
        )
        .bind(data.case_id)
        .bind(data.sender_role)
        .bind(&data.body_enc)
        .bind(data.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to insert message"))
    }

    async fn list_messages(&self, case_id: Uuid) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, case_id, sender_role, body_enc, created_at
            FROM wb_messages
            WHERE case_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list messages"))
    }

    async fn has_valid_reply_token(
        &self,
        case_id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let found: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM wb_reply_tokens
            WHERE case_id = $1 AND token_hash = $2 AND expires_at > $3
            LIMIT 1
            "#,
        )
        .bind(case_id)
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to check reply token"))?;

        Ok(found.is_some())
    }

    async fn insert_attachment(&self, data: &NewAttachment) -> Result<Attachment> {
        let sql = format!(
            r#"
            INSERT INTO wb_attachments (
                case_id, original_filename, mime_type, size_bytes, content_hash,
                av_status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6)
            RETURNING {ATTACHMENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Attachment>(&sql)
            .bind(data.case_id)
            .bind(&data.original_filename)
            .bind(&data.mime_type)
            .bind(data.size_bytes)
            .bind(&data.content_hash)
            .bind(data.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to insert attachment"))
    }

    async fn set_attachment_storage_key(&self, id: Uuid, storage_key: &str) -> Result<()> {
        sqlx::query("UPDATE wb_attachments SET storage_key = $2 WHERE id = $1")
            .bind(id)
            .bind(storage_key)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to set attachment storage key"))?;
        Ok(())
    }

    async fn set_attachment_av_status(&self, id: Uuid, status: AvStatus) -> Result<Attachment> {
        let sql = format!(
            "UPDATE wb_attachments SET av_status = $2 WHERE id = $1 RETURNING {ATTACHMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Attachment>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update attachment status"))?
            .ok_or_else(|| AppError::NotFound("Attachment not found".to_string()))
    }

    async fn find_attachment(&self, case_id: Uuid, id: Uuid) -> Result<Option<Attachment>> {
        let sql =
            format!("SELECT {ATTACHMENT_COLUMNS} FROM wb_attachments WHERE id = $1 AND case_id = $2");
        sqlx::query_as::<_, Attachment>(&sql)
            .bind(id)
            .bind(case_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch attachment"))
    }

    async fn list_attachments(&self, case_id: Uuid) -> Result<Vec<Attachment>> {
        let sql = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM wb_attachments WHERE case_id = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Attachment>(&sql)
            .bind(case_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list attachments"))
    }

    async fn delete_attachment(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wb_attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete attachment"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_audit(&self, entry: &NewAuditEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wb_audit_entries (case_id, actor_role, action, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.case_id)
        .bind(entry.actor_role)
        .bind(entry.action)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to append audit entry"))?;
        Ok(())
    }

    async fn list_audit(&self, case_id: Uuid) -> Result<Vec<AuditEntry>> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, case_id, actor_role, action, metadata, created_at
            FROM wb_audit_entries
            WHERE case_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list audit entries"))
    }

    async fn list_unacknowledged(
        &self,
        manager_id: &str,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Case>> {
        let sql = format!(
            r#"
            SELECT {CASE_COLUMNS}
            FROM wb_cases
            WHERE manager_id = $1 AND acknowledged_at IS NULL AND created_at < $2
            ORDER BY created_at ASC
            "#
        );
        sqlx::query_as::<_, Case>(&sql)
            .bind(manager_id)
            .bind(created_before)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list unacknowledged cases"))
    }

    async fn list_unanswered(
        &self,
        manager_id: &str,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Case>> {
        let sql = format!(
            r#"
            SELECT {CASE_COLUMNS}
            FROM wb_cases
            WHERE manager_id = $1 AND first_response_at IS NULL AND created_at < $2
            ORDER BY created_at ASC
            "#
        );
        sqlx::query_as::<_, Case>(&sql)
            .bind(manager_id)
            .bind(created_before)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list unanswered cases"))
    }

    async fn list_closed_before(&self, closed_before: DateTime<Utc>) -> Result<Vec<Case>> {
        let sql = format!(
            r#"
            SELECT {CASE_COLUMNS}
            FROM wb_cases
            WHERE status IN ('closed_substantiated', 'closed_unsubstantiated', 'closed_other')
              AND closed_at IS NOT NULL
              AND closed_at < $1
            ORDER BY closed_at ASC
            "#
        );
        sqlx::query_as::<_, Case>(&sql)
            .bind(closed_before)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list closed cases"))
    }

    async fn purge_case(&self, id: Uuid, closed_before: DateTime<Utc>) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin purge transaction"))?;

        let locked: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM wb_cases
            WHERE id = $1
              AND status IN ('closed_substantiated', 'closed_unsubstantiated', 'closed_other')
              AND closed_at IS NOT NULL
              AND closed_at < $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(closed_before)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock case for purge"))?;

        if locked.is_none() {
            return Ok(false);
        }

        for statement in [
            "DELETE FROM wb_reply_tokens WHERE case_id = $1",
            "DELETE FROM wb_messages WHERE case_id = $1",
            "DELETE FROM wb_attachments WHERE case_id = $1",
            "DELETE FROM wb_cases WHERE id = $1",
        ] {
            sqlx::query(statement)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to purge case"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit purge transaction"))?;

        Ok(true)
    }
}

/// Escape LIKE wildcards in user input
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
