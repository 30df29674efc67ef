//! Fully wired services over in-memory fakes

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use crate::core::config::RateLimitConfig;
use crate::features::categories::StaticCategoryCatalog;
use crate::features::rate_limits::RateLimitService;
use crate::features::users::{DirectoryUser, StaticUserDirectory};
use crate::features::whistleblowing::dtos::{CreateReportDto, PostMessageDto, UploadedFile};
use crate::features::whistleblowing::handlers::WbState;
use crate::features::whistleblowing::models::Case;
use crate::features::whistleblowing::repository::{CaseStore, InMemoryCaseStore};
use crate::features::whistleblowing::services::{
    AttachmentService, CaseAccess, CaseService, IntakeService, ManagerResolver, ThreadService,
    WbSettings,
};
use crate::modules::antivirus::{ScanVerdict, StubScanner};
use crate::modules::crypto::CaseCipher;
use crate::modules::notifier::{NotificationDispatcher, RecordingNotifier};
use crate::modules::storage::LocalStorage;
use crate::shared::clock::ManualClock;
use crate::shared::test_helpers::TEST_MANAGER_ROLE;

pub struct Harness {
    pub store: Arc<InMemoryCaseStore>,
    pub clock: Arc<ManualClock>,
    pub scanner: Arc<StubScanner>,
    pub notifier: Arc<RecordingNotifier>,
    pub storage: Arc<LocalStorage>,
    pub managers: Arc<ManagerResolver>,
    pub access: Arc<CaseAccess>,
    pub intake: Arc<IntakeService>,
    pub threads: Arc<ThreadService>,
    pub attachments: Arc<AttachmentService>,
    pub cases: Arc<CaseService>,
    pub active_category: Uuid,
    _storage_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(true, RecordingNotifier::default(), WbSettings::default())
    }

    /// No user holds the manager role
    pub fn without_manager() -> Self {
        Self::build(false, RecordingNotifier::default(), WbSettings::default())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self::build(true, notifier, WbSettings::default())
    }

    pub fn with_max_attachment_size(bytes: usize) -> Self {
        let settings = WbSettings {
            max_attachment_size: bytes,
            ..WbSettings::default()
        };
        Self::build(true, RecordingNotifier::default(), settings)
    }

    fn build(with_manager: bool, notifier: RecordingNotifier, settings: WbSettings) -> Self {
        let storage_dir = tempfile::tempdir().unwrap();

        let mut users = StaticUserDirectory::default().with_user(
            DirectoryUser {
                id: "emp-1".to_string(),
                email: Some("emp-1@example.com".to_string()),
                display_name: Some("Erin Employee".to_string()),
            },
            &["employee"],
        );
        if with_manager {
            users = users.with_user(
                DirectoryUser {
                    id: "mgr-1".to_string(),
                    email: Some("wb-manager@example.com".to_string()),
                    display_name: Some("Case Manager".to_string()),
                },
                &[TEST_MANAGER_ROLE],
            );
        }

        let store = Arc::new(InMemoryCaseStore::default());
        let users = Arc::new(users);
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
        ));
        let scanner = Arc::new(StubScanner::new(ScanVerdict::Pending));
        let notifier = Arc::new(notifier);
        let storage = Arc::new(LocalStorage::new(storage_dir.path()));
        let cipher = Arc::new(CaseCipher::new(&[7u8; 32]));
        let active_category = Uuid::new_v4();
        let categories = Arc::new(StaticCategoryCatalog::with_active(&[active_category]));
        let settings = Arc::new(settings);
        let dispatcher = NotificationDispatcher::new(notifier.clone());

        let managers = Arc::new(ManagerResolver::new(
            users.clone(),
            TEST_MANAGER_ROLE,
            Duration::from_secs(300),
            clock.clone(),
        ));
        let access = Arc::new(CaseAccess::new(store.clone(), managers.clone(), clock.clone()));

        let intake = Arc::new(IntakeService::new(
            store.clone(),
            cipher.clone(),
            managers.clone(),
            categories.clone(),
            dispatcher.clone(),
            clock.clone(),
            settings.clone(),
        ));
        let threads = Arc::new(ThreadService::new(
            store.clone(),
            cipher.clone(),
            access.clone(),
            users.clone(),
            dispatcher,
            clock.clone(),
            settings.clone(),
        ));
        let attachments = Arc::new(AttachmentService::new(
            store.clone(),
            storage.clone(),
            scanner.clone(),
            clock.clone(),
            settings,
        ));
        let cases = Arc::new(CaseService::new(
            store.clone(),
            cipher.clone(),
            access.clone(),
            users.clone(),
            categories,
            clock.clone(),
        ));

        Self {
            store,
            clock,
            scanner,
            notifier,
            storage,
            managers,
            access,
            intake,
            threads,
            attachments,
            cases,
            active_category,
            _storage_dir: storage_dir,
        }
    }

    pub async fn case_by_protocol(&self, protocol: &str) -> Case {
        self.store
            .find_case_by_protocol(protocol)
            .await
            .unwrap()
            .expect("case exists")
    }

    /// Submit an anonymous report and return its case
    pub async fn anonymous_case(&self) -> Case {
        let created = self
            .intake
            .create_anonymous_report(report_dto("Anonymous concern"))
            .await
            .unwrap();
        self.case_by_protocol(&created.protocol).await
    }

    /// Handler state over this harness's services
    pub fn state(&self, rate_limits: RateLimitConfig) -> WbState {
        WbState {
            intake: self.intake.clone(),
            threads: self.threads.clone(),
            attachments: self.attachments.clone(),
            cases: self.cases.clone(),
            access: self.access.clone(),
            rate_limits: Arc::new(RateLimitService::new(&rate_limits, self.clock.clone())),
        }
    }

    /// Let detached notification tasks run
    pub async fn settle(&self) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }
}

pub fn report_dto(title: &str) -> CreateReportDto {
    CreateReportDto {
        title: title.to_string(),
        description: "Details of the concern".to_string(),
        category_id: None,
        policy_accepted: true,
        policy_version: None,
    }
}

pub fn message(body: &str) -> PostMessageDto {
    PostMessageDto {
        body: body.to_string(),
    }
}

pub fn upload(filename: &str, bytes: &[u8]) -> UploadedFile {
    UploadedFile {
        filename: filename.to_string(),
        content_type: "application/pdf".to_string(),
        bytes: bytes.to_vec(),
    }
}
