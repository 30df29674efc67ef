//! Outbound notifications
//!
//! Delivery is always best-effort: [`NotificationDispatcher::dispatch`] runs
//! the send on a detached task and only logs failures.

mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use smtp::SmtpNotifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier used when no SMTP server is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            recipients = notification.to.len(),
            subject = %notification.subject,
            "Notification (mail delivery disabled)"
        );
        Ok(())
    }
}

/// Fire-and-forget front for a [`Notifier`]
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Send on a detached task. The handle resolves to whether delivery succeeded;
    /// callers are free to drop it.
    pub fn dispatch(&self, notification: Notification) -> JoinHandle<bool> {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move { send_best_effort(notifier.as_ref(), &notification).await })
    }
}

/// Send and swallow any failure
pub async fn send_best_effort(notifier: &dyn Notifier, notification: &Notification) -> bool {
    if notification.to.is_empty() {
        debug!("Notification skipped: no recipients");
        return false;
    }

    match notifier.send(notification).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Notification delivery failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
pub use recording::RecordingNotifier;

#[cfg(test)]
mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Notifier that keeps every message, optionally failing each send
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<Notification>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Transport("connection refused".to_string()));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }
}
