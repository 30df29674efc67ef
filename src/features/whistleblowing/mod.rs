//! Whistleblowing report lifecycle.
//!
//! | Context   | Entry point                              |
//! |-----------|------------------------------------------|
//! | anonymous | `/api/wb/anonymous/...` + `X-Reply-Token`  |
//! | reporter  | `/api/wb/reports/...` (session)          |
//! | manager   | `/api/wb/manager/cases/...` (role-gated) |
//!
//! Descriptions and message bodies are encrypted at rest; titles, protocol
//! codes and timestamps are not. Background jobs live in [`workers`].

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod workers;

#[cfg(test)]
pub(crate) mod test_support;

pub use handlers::WbState;
pub use repository::{CaseStore, PgCaseStore};
pub use services::{
    AttachmentService, CaseAccess, CaseService, IntakeService, ManagerResolver, ThreadService,
    WbSettings,
};
pub use workers::{spawn_daily, DailySchedule, DeadlineReminderJob, RetentionPurgeJob};
