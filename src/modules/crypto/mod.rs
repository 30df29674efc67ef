//! Encryption at rest for case data and secret utilities
//!
//! - [`CaseCipher`]: AES-256-GCM envelope for JSON payloads
//! - [`tokens`]: reply tokens, token hashing and protocol codes

mod codec;
pub mod tokens;

pub use codec::{CaseCipher, CryptoError};
