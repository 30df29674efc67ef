use chrono::{DateTime, Datelike, Utc};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

/// Random bytes behind a reply token (256 bits)
const REPLY_TOKEN_BYTES: usize = 32;

/// Produce a protocol code `WB-<year>-<6 digits>` for the given instant
pub fn generate_protocol_code(now: DateTime<Utc>) -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("WB-{}-{:06}", now.year(), n)
}

/// Generate a printable reply token with 256 bits of entropy
pub fn generate_reply_token() -> String {
    let mut bytes = [0u8; REPLY_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// One-way hash used to store and verify reply tokens
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Hex SHA-256 of raw attachment bytes
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
