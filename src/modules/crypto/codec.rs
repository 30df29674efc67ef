//! Authenticated encryption of JSON payloads.
//!
//! Blob layout (all lengths in bytes):
//!
//! ```text
//! +-----------+-----------+----------------+
//! | nonce (12)| tag (16)  | ciphertext (n) |
//! +-----------+-----------+----------------+
//! ```
//!
//! The nonce is random per call. Decryption fails closed on any tag mismatch.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Failed to serialize payload: {0}")]
    Serialize(String),

    #[error("Encryption failed")]
    Encrypt,

    #[error("Encrypted blob is truncated")]
    Truncated,

    #[error("Decryption failed")]
    Decrypt,

    #[error("Failed to deserialize payload: {0}")]
    Deserialize(String),
}

/// Symmetric cipher for case descriptions and message bodies
pub struct CaseCipher {
    cipher: Aes256Gcm,
}

impl CaseCipher {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Serialize `value` to JSON and seal it into an opaque blob
    pub fn encrypt<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CryptoError> {
        let mut buffer =
            serde_json::to_vec(value).map_err(|e| CryptoError::Serialize(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let tag = self
            .cipher
            .encrypt_in_place_detached(nonce, b"", &mut buffer)
            .map_err(|_| CryptoError::Encrypt)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + TAG_LEN + buffer.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(tag.as_slice());
        blob.extend_from_slice(&buffer);
        Ok(blob)
    }

    /// Open a blob produced by [`CaseCipher::encrypt`]
    pub fn decrypt<T: DeserializeOwned>(&self, blob: &[u8]) -> Result<T, CryptoError> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Truncated);
        }

        let (nonce_bytes, rest) = blob.split_at(NONCE_LEN);
        let (tag_bytes, ciphertext) = rest.split_at(TAG_LEN);

        let mut buffer = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(nonce_bytes),
                b"",
                &mut buffer,
                Tag::from_slice(tag_bytes),
            )
            .map_err(|_| CryptoError::Decrypt)?;

        serde_json::from_slice(&buffer).map_err(|e| CryptoError::Deserialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        description: String,
        tags: Vec<String>,
    }

    fn cipher() -> CaseCipher {
        CaseCipher::new(&[42u8; 32])
    }

    #[test]
    fn test_round_trip_struct() {
        let payload = Payload {
            description: "Forklift brakes ignored for weeks".to_string(),
            tags: vec!["safety".to_string()],
        };
        let blob = cipher().encrypt(&payload).unwrap();
        let back: Payload = cipher().decrypt(&blob).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_round_trip_json_values() {
        let values = [
            json!(null),
            json!(""),
            json!({"nested": {"n": 1, "list": [true, false]}}),
            json!("ünïcödé ✓"),
        ];
        for value in values {
            let blob = cipher().encrypt(&value).unwrap();
            let back: serde_json::Value = cipher().decrypt(&blob).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_layout_and_random_nonce() {
        let a = cipher().encrypt(&json!({"k": "v"})).unwrap();
        let b = cipher().encrypt(&json!({"k": "v"})).unwrap();
        let plaintext_len = serde_json::to_vec(&json!({"k": "v"})).unwrap().len();
        assert_eq!(a.len(), NONCE_LEN + TAG_LEN + plaintext_len);
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }

    #[test]
    fn test_any_flipped_byte_fails() {
        let blob = cipher()
            .encrypt(&json!({"description": "tamper me"}))
            .unwrap();
        for i in 0..blob.len() {
            let mut tampered = blob.clone();
            tampered[i] ^= 0x01;
            let result: Result<serde_json::Value, _> = cipher().decrypt(&tampered);
            assert!(result.is_err(), "byte {} flip was not detected", i);
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob = cipher().encrypt(&json!("secret")).unwrap();
        let other = CaseCipher::new(&[7u8; 32]);
        let result: Result<String, _> = other.decrypt(&blob);
        assert!(matches!(result, Err(CryptoError::Decrypt)));
    }

    #[test]
    fn test_truncated_blob() {
        let result: Result<String, _> = cipher().decrypt(&[0u8; 10]);
        assert!(matches!(result, Err(CryptoError::Truncated)));
    }
}
