use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use super::{ScanVerdict, VirusScanner};

/// Runs a ClamAV-compatible command line scanner per file.
///
/// Exit status 0 means clean, 1 means a signature matched, anything else
/// (including spawn failures and timeouts) leaves the file pending.
pub struct ClamScanner {
    binary: PathBuf,
    timeout: Duration,
}

impl ClamScanner {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn verdict_for_exit_code(code: Option<i32>) -> ScanVerdict {
        match code {
            Some(0) => ScanVerdict::Clean,
            Some(1) => ScanVerdict::Quarantined,
            _ => ScanVerdict::Pending,
        }
    }
}

#[async_trait]
impl VirusScanner for ClamScanner {
    async fn scan(&self, path: &Path) -> ScanVerdict {
        let child = Command::new(&self.binary)
            .arg("--no-summary")
            .arg("--infected")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(status)) => {
                let verdict = Self::verdict_for_exit_code(status.code());
                match verdict {
                    ScanVerdict::Pending => {
                        warn!("Scanner exited with unexpected status {:?}", status.code())
                    }
                    _ => info!("Scan finished: {:?}", verdict),
                }
                verdict
            }
            Ok(Err(e)) => {
                warn!("Failed to run scanner {}: {}", self.binary.display(), e);
                ScanVerdict::Pending
            }
            Err(_) => {
                warn!("Scanner timed out after {:?}", self.timeout);
                ScanVerdict::Pending
            }
        }
    }
}
