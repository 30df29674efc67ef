mod attachment;
mod audit_entry;
mod case;
mod message;
mod reply_token;

pub use attachment::{Attachment, AvStatus, NewAttachment};
pub use audit_entry::{ActorRole, AuditEntry, NewAuditEntry};
pub use case::{Case, CaseChanges, CaseFilter, CaseStatus, DescriptionPayload, NewCase};
pub use message::{Message, MessagePayload, NewMessage, SenderRole};
pub use reply_token::IssuedReplyToken;
