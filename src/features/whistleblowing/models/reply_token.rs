use chrono::{DateTime, Utc};

/// Reply token issued together with an anonymous case. Only the hash of the
/// raw secret is ever persisted.
#[derive(Debug, Clone)]
pub struct IssuedReplyToken {
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
