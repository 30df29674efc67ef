//! Antivirus scanning for uploaded attachments
//!
//! Scanners never fail: anything other than a definite verdict maps to
//! [`ScanVerdict::Pending`], which keeps the file hidden from reporters.

mod clamav;

use std::path::Path;

use async_trait::async_trait;

use crate::features::whistleblowing::models::AvStatus;

pub use clamav::ClamScanner;

/// Outcome of scanning one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Quarantined,
    Pending,
}

impl From<ScanVerdict> for AvStatus {
    fn from(v: ScanVerdict) -> Self {
        match v {
            ScanVerdict::Clean => AvStatus::Clean,
            ScanVerdict::Quarantined => AvStatus::Quarantined,
            ScanVerdict::Pending => AvStatus::Pending,
        }
    }
}

#[async_trait]
pub trait VirusScanner: Send + Sync {
    async fn scan(&self, path: &Path) -> ScanVerdict;
}

/// Scanner used when AV_MODE=disabled
pub struct DisabledScanner;

#[async_trait]
impl VirusScanner for DisabledScanner {
    async fn scan(&self, _path: &Path) -> ScanVerdict {
        ScanVerdict::Pending
    }
}

#[cfg(test)]
pub use stub::StubScanner;

#[cfg(test)]
mod stub {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scanner returning a configurable verdict
    pub struct StubScanner {
        verdict: Mutex<ScanVerdict>,
        calls: AtomicUsize,
    }

    impl StubScanner {
        pub fn new(verdict: ScanVerdict) -> Self {
            Self {
                verdict: Mutex::new(verdict),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn set(&self, verdict: ScanVerdict) {
            *self.verdict.lock().unwrap() = verdict;
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VirusScanner for StubScanner {
        async fn scan(&self, _path: &Path) -> ScanVerdict {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.verdict.lock().unwrap()
        }
    }
}
