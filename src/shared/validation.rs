use lazy_static::lazy_static;
use regex::Regex;

use crate::core::error::{AppError, Result};
use crate::shared::constants::MAX_FILENAME_LENGTH;

lazy_static! {
    /// Regex for case protocol codes
    /// - Valid: "WB-2025-000123", "WB-1999-999999"
    /// - Invalid: "wb-2025-000123", "WB-25-000123", "WB-2025-12345"
    pub static ref PROTOCOL_REGEX: Regex = Regex::new(r"^WB-\d{4}-\d{6}$").unwrap();
}

/// Trim a required free-text field, rejecting empty or whitespace-only input
pub fn require_text(value: &str, field: &str, max_len: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(trimmed.to_string())
}

/// Reduce a client-supplied filename to a safe display name.
///
/// Keeps only the last path component, drops control characters and caps the
/// length. The result is metadata only and never part of a storage path.
pub fn sanitize_filename(raw: &str) -> String {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim();

    if cleaned.is_empty() {
        return "attachment".to_string();
    }

    cleaned.chars().take(MAX_FILENAME_LENGTH).collect()
}

/// Normalise a protocol code lookup key
pub fn normalize_protocol(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    PROTOCOL_REGEX.is_match(&code).then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_regex() {
        assert!(PROTOCOL_REGEX.is_match("WB-2025-000123"));
        assert!(PROTOCOL_REGEX.is_match("WB-1999-999999"));
        assert!(!PROTOCOL_REGEX.is_match("wb-2025-000123"));
        assert!(!PROTOCOL_REGEX.is_match("WB-25-000123"));
        assert!(!PROTOCOL_REGEX.is_match("WB-2025-12345"));
        assert!(!PROTOCOL_REGEX.is_match("WB-2025-0001234"));
    }

    #[test]
    fn test_normalize_protocol() {
        assert_eq!(
            normalize_protocol(" wb-2025-000042 ").as_deref(),
            Some("WB-2025-000042")
        );
        assert_eq!(normalize_protocol("WB-2025-42"), None);
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("  hi  ", "title", 10).unwrap(), "hi");
        assert!(matches!(
            require_text(" \n\t ", "title", 10),
            Err(AppError::Validation(_))
        ));
        assert!(require_text("abcdefghijk", "title", 10).is_err());
    }

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("evidence\u{0000}\u{0007}.png"), "evidence.png");
    }

    #[test]
    fn test_sanitize_filename_fallbacks() {
        assert_eq!(sanitize_filename(""), "attachment");
        assert_eq!(sanitize_filename("../"), "attachment");
        assert_eq!(sanitize_filename("..."), "attachment");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }

    #[test]
    fn test_sanitize_filename_caps_length() {
        let long = "a".repeat(400) + ".txt";
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_FILENAME_LENGTH);
    }
}
