use crate::core::config::WhistleblowingConfig;

/// Tunables shared by the whistleblowing services
#[derive(Debug, Clone)]
pub struct WbSettings {
    pub reply_token_ttl: chrono::Duration,
    pub default_policy_version: String,
    pub max_attachment_size: usize,
    /// Copied on every manager notification
    pub extra_recipients: Vec<String>,
}

impl From<&WhistleblowingConfig> for WbSettings {
    fn from(config: &WhistleblowingConfig) -> Self {
        Self {
            reply_token_ttl: chrono::Duration::days(config.reply_token_ttl_days),
            default_policy_version: config.default_policy_version.clone(),
            max_attachment_size: config.max_attachment_size,
            extra_recipients: config.extra_recipients.clone(),
        }
    }
}

#[cfg(test)]
impl Default for WbSettings {
    fn default() -> Self {
        Self {
            reply_token_ttl: chrono::Duration::days(180),
            default_policy_version: "1.0".to_string(),
            max_attachment_size: 20 * 1024 * 1024,
            extra_recipients: Vec::new(),
        }
    }
}
