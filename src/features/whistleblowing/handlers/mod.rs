mod anonymous_handler;
mod manager_handler;
mod reporter_handler;
mod transfer;

use std::sync::Arc;

use crate::features::rate_limits::RateLimitService;
use crate::features::whistleblowing::services::{
    AttachmentService, CaseAccess, CaseService, IntakeService, ThreadService,
};

pub use anonymous_handler::*;
pub use manager_handler::*;
pub use reporter_handler::*;

/// State shared by all whistleblowing handlers
#[derive(Clone)]
pub struct WbState {
    pub intake: Arc<IntakeService>,
    pub threads: Arc<ThreadService>,
    pub attachments: Arc<AttachmentService>,
    pub cases: Arc<CaseService>,
    pub access: Arc<CaseAccess>,
    pub rate_limits: Arc<RateLimitService>,
}
