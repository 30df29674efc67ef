//! Outbound notification texts.
//!
//! Notices carry the protocol code only. Titles, descriptions, message bodies
//! and reporter identities never leave the system by mail.

use crate::modules::notifier::Notification;

pub fn new_report(to: Vec<String>, protocol: &str) -> Notification {
    Notification {
        to,
        subject: format!("New whistleblowing report {}", protocol),
        body: format!(
            "A new whistleblowing report has been filed.\n\n\
             Protocol: {}\n\n\
             Open the case management console to review it.",
            protocol
        ),
    }
}

pub fn reporter_message(to: Vec<String>, protocol: &str) -> Notification {
    Notification {
        to,
        subject: format!("New reporter message on {}", protocol),
        body: format!(
            "The reporter added a message to case {}.\n\n\
             Open the case management console to read it.",
            protocol
        ),
    }
}

pub fn manager_reply(to: Vec<String>, protocol: &str) -> Notification {
    Notification {
        to,
        subject: format!("Update on your report {}", protocol),
        body: format!(
            "The case manager has replied on report {}.\n\n\
             Sign in to read the reply.",
            protocol
        ),
    }
}

/// Daily digest of cases past a handling deadline
pub fn deadline_digest(
    to: Vec<String>,
    unacknowledged: &[String],
    unanswered: &[String],
) -> Notification {
    let mut body = String::from("Whistleblowing cases needing attention.\n");
    if !unacknowledged.is_empty() {
        body.push_str("\nNot acknowledged within the acknowledgement deadline:\n");
        for protocol in unacknowledged {
            body.push_str(&format!("  - {}\n", protocol));
        }
    }
    if !unanswered.is_empty() {
        body.push_str("\nNo response within the feedback deadline:\n");
        for protocol in unanswered {
            body.push_str(&format!("  - {}\n", protocol));
        }
    }

    Notification {
        to,
        subject: format!(
            "Whistleblowing deadlines: {} unacknowledged, {} unanswered",
            unacknowledged.len(),
            unanswered.len()
        ),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_lists_both_rules() {
        let n = deadline_digest(
            vec!["m@example.com".into()],
            &["WB-2025-000001".into()],
            &["WB-2025-000001".into(), "WB-2025-000002".into()],
        );
        assert_eq!(n.subject, "Whistleblowing deadlines: 1 unacknowledged, 2 unanswered");
        assert_eq!(n.body.matches("WB-2025-000001").count(), 2);
        assert!(n.body.contains("WB-2025-000002"));
    }
}
