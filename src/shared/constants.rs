/// Maximum number of cases returned by the manager case list
pub const MANAGER_CASE_PAGE_SIZE: i64 = 200;

/// Maximum length of a report title
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a report description or message body
pub const MAX_BODY_LENGTH: usize = 20_000;

/// Maximum length of a stored attachment filename
pub const MAX_FILENAME_LENGTH: usize = 150;

/// Number of protocol codes tried before giving up on a uniqueness collision
pub const MAX_PROTOCOL_ATTEMPTS: usize = 5;

// =============================================================================
// AUDIT ACTIONS
// =============================================================================

pub const AUDIT_CREATED: &str = "CREATED";
pub const AUDIT_MESSAGE_SENT: &str = "MESSAGE_SENT";
pub const AUDIT_VIEWED: &str = "VIEWED";
pub const AUDIT_REPORT_UPDATED: &str = "REPORT_UPDATED";
pub const AUDIT_ATTACHMENT_UPLOADED: &str = "ATTACHMENT_UPLOADED";
pub const AUDIT_ATTACHMENT_RESCANNED: &str = "ATTACHMENT_RESCANNED";
pub const AUDIT_ATTACHMENT_DELETED: &str = "ATTACHMENT_DELETED";
pub const AUDIT_PURGED: &str = "PURGED";
