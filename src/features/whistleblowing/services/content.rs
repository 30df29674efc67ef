//! Sealing and opening of encrypted case content

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::whistleblowing::dtos::MessageDto;
use crate::features::whistleblowing::models::{
    Case, DescriptionPayload, Message, MessagePayload,
};
use crate::modules::crypto::{CaseCipher, CryptoError};

fn sealing_failed(e: CryptoError) -> AppError {
    tracing::error!("Failed to encrypt case content: {}", e);
    AppError::Internal("Failed to encrypt case content".to_string())
}

fn opening_failed(case_id: Uuid, e: CryptoError) -> AppError {
    tracing::error!(%case_id, "Failed to decrypt case content: {}", e);
    AppError::Internal("Failed to decrypt case content".to_string())
}

pub fn seal_description(cipher: &CaseCipher, description: &str) -> Result<Vec<u8>> {
    cipher
        .encrypt(&DescriptionPayload {
            description: description.to_string(),
        })
        .map_err(sealing_failed)
}

pub fn seal_message(cipher: &CaseCipher, body: &str) -> Result<Vec<u8>> {
    cipher
        .encrypt(&MessagePayload {
            body: body.to_string(),
        })
        .map_err(sealing_failed)
}

/// Decrypt a case description. An absent or empty blob reads as an empty string.
pub fn open_description(cipher: &CaseCipher, case: &Case) -> Result<String> {
    match case.description_enc.as_deref() {
        None | Some([]) => Ok(String::new()),
        Some(blob) => cipher
            .decrypt::<DescriptionPayload>(blob)
            .map(|p| p.description)
            .map_err(|e| opening_failed(case.id, e)),
    }
}

pub fn open_messages(cipher: &CaseCipher, messages: Vec<Message>) -> Result<Vec<MessageDto>> {
    messages
        .into_iter()
        .map(|m| {
            let payload: MessagePayload = cipher
                .decrypt(&m.body_enc)
                .map_err(|e| opening_failed(m.case_id, e))?;
            Ok(MessageDto {
                id: m.id,
                sender_role: m.sender_role,
                body: payload.body,
                created_at: m.created_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::whistleblowing::models::{CaseStatus, SenderRole};
    use chrono::Utc;

    fn case_with(description_enc: Option<Vec<u8>>) -> Case {
        let now = Utc::now();
        Case {
            id: Uuid::new_v4(),
            protocol_code: "WB-2025-000001".into(),
            title: "t".into(),
            description_enc,
            is_anonymous: true,
            reporter_user_id: None,
            manager_id: "m".into(),
            category_id: None,
            status: CaseStatus::Submitted,
            policy_accepted: true,
            policy_version: "1.0".into(),
            created_at: now,
            acknowledged_at: None,
            first_response_at: None,
            closed_at: None,
            last_update: now,
        }
    }

    #[test]
    fn test_empty_description_reads_as_empty() {
        let cipher = CaseCipher::new(&[3u8; 32]);
        assert_eq!(open_description(&cipher, &case_with(None)).unwrap(), "");
        assert_eq!(open_description(&cipher, &case_with(Some(vec![]))).unwrap(), "");
    }

    #[test]
    fn test_wrong_key_is_internal_error() {
        let sealed = seal_description(&CaseCipher::new(&[1u8; 32]), "secret").unwrap();
        let other = CaseCipher::new(&[2u8; 32]);
        assert!(matches!(
            open_description(&other, &case_with(Some(sealed))),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_messages_are_opened_in_order() {
        let cipher = CaseCipher::new(&[4u8; 32]);
        let case_id = Uuid::new_v4();
        let now = Utc::now();
        let messages = ["first", "second"]
            .iter()
            .enumerate()
            .map(|(i, body)| Message {
                id: Uuid::new_v4(),
                case_id,
                sender_role: SenderRole::Reporter,
                body_enc: seal_message(&cipher, body).unwrap(),
                created_at: now + chrono::Duration::seconds(i as i64),
            })
            .collect();

        let opened = open_messages(&cipher, messages).unwrap();
        let bodies: Vec<&str> = opened.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }
}
