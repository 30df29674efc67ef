mod attachment_service;
mod case_access;
mod case_service;
pub(crate) mod content;
mod intake_service;
mod manager_directory;
pub(crate) mod notices;
mod settings;
mod thread_service;

pub use attachment_service::{AttachmentService, AttachmentViewer};
pub use case_access::CaseAccess;
pub use case_service::CaseService;
pub use intake_service::IntakeService;
pub use manager_directory::ManagerResolver;
pub use settings::WbSettings;
pub use thread_service::ThreadService;
