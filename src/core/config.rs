use std::env;
use std::time::Duration;

use base64::prelude::*;
use chrono::FixedOffset;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub whistleblowing: WhistleblowingConfig,
    pub antivirus: AntivirusConfig,
    pub rate_limits: RateLimitConfig,
    pub smtp: Option<SmtpConfig>,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Honour X-Forwarded-For / X-Real-IP when resolving the client address
    pub trust_proxy_headers: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub jwks_cache_ttl: Duration,
    pub jwt_leeway: Duration,
    /// Name of the JWT claim carrying the actor's roles
    pub roles_claim: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Case handling settings for the whistleblowing subsystem
#[derive(Clone)]
pub struct WhistleblowingConfig {
    /// Raw 256-bit key for case data encryption
    pub encryption_key: [u8; 32],
    pub storage_root: String,
    pub manager_role: String,
    pub manager_cache_ttl: Duration,
    pub default_policy_version: String,
    pub reply_token_ttl_days: i64,
    pub max_attachment_size: usize,
    pub retention_months: u32,
    pub ack_reminder_days: i64,
    pub response_reminder_months: u32,
    pub extra_recipients: Vec<String>,
}

impl std::fmt::Debug for WhistleblowingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhistleblowingConfig")
            .field("encryption_key", &"<redacted>")
            .field("storage_root", &self.storage_root)
            .field("manager_role", &self.manager_role)
            .field("manager_cache_ttl", &self.manager_cache_ttl)
            .field("default_policy_version", &self.default_policy_version)
            .field("reply_token_ttl_days", &self.reply_token_ttl_days)
            .field("max_attachment_size", &self.max_attachment_size)
            .field("retention_months", &self.retention_months)
            .field("ack_reminder_days", &self.ack_reminder_days)
            .field("response_reminder_months", &self.response_reminder_months)
            .field("extra_recipients", &self.extra_recipients)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntivirusMode {
    Disabled,
    Local,
}

#[derive(Debug, Clone)]
pub struct AntivirusConfig {
    pub mode: AntivirusMode,
    pub scanner_path: String,
    pub timeout: Duration,
}

/// Limits for the unauthenticated whistleblowing endpoints
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub reports_max: usize,
    pub reports_window: Duration,
    pub messages_max: usize,
    pub messages_window: Duration,
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

/// Daily schedules for the background jobs
#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub enabled: bool,
    pub utc_offset: FixedOffset,
    pub reminder_at: (u32, u32),
    pub retention_at: (u32, u32),
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            whistleblowing: WhistleblowingConfig::from_env()?,
            antivirus: AntivirusConfig::from_env()?,
            rate_limits: RateLimitConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
            jobs: JobsConfig::from_env()?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", name)),
        _ => Ok(default),
    }
}

fn parse_bool_env(name: &str, default: bool) -> Result<bool, String> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(format!("{} must be a boolean", name)),
        },
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a wall-clock time in `HH:MM` form
pub fn parse_time_of_day(raw: &str) -> Option<(u32, u32)> {
    let (h, m) = raw.trim().split_once(':')?;
    let hour = h.parse::<u32>().ok()?;
    let minute = m.parse::<u32>().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// Decode the base64 case encryption key, requiring exactly 32 raw bytes
pub fn decode_encryption_key(raw: &str) -> Result<[u8; 32], String> {
    let bytes = BASE64_STANDARD
        .decode(raw.trim())
        .map_err(|_| "WB_ENCRYPTION_KEY must be valid base64".to_string())?;
    bytes
        .try_into()
        .map_err(|_| "WB_ENCRYPTION_KEY must decode to exactly 32 bytes".to_string())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins =
            split_list(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let trust_proxy_headers = parse_bool_env("TRUST_PROXY_HEADERS", false)?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            trust_proxy_headers,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_env("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_env("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_env(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_env("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_env("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600; // 1 hour
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let issuer = env::var("OIDC_ISSUER")
            .map_err(|_| "OIDC_ISSUER environment variable is required".to_string())?;

        let audience = env::var("OIDC_AUDIENCE")
            .map_err(|_| "OIDC_AUDIENCE environment variable is required".to_string())?;

        let jwks_cache_ttl_secs = parse_env("JWKS_CACHE_TTL", Self::DEFAULT_JWKS_CACHE_TTL_SECS)?;
        let jwt_leeway_secs = parse_env("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;

        let roles_claim = env::var("OIDC_ROLES_CLAIM")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "roles".to_string());

        Ok(Self {
            issuer,
            audience,
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
            roles_claim,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Whistleblowing API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Whistleblowing report intake and case management".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl WhistleblowingConfig {
    const DEFAULT_MANAGER_CACHE_TTL_SECS: u64 = 300;
    const DEFAULT_REPLY_TOKEN_TTL_DAYS: i64 = 180;
    const DEFAULT_MAX_ATTACHMENT_SIZE: usize = 20 * 1024 * 1024; // 20MB
    const DEFAULT_RETENTION_MONTHS: u32 = 60; // 5 years
    const DEFAULT_ACK_REMINDER_DAYS: i64 = 7;
    const DEFAULT_RESPONSE_REMINDER_MONTHS: u32 = 3;

    pub fn from_env() -> Result<Self, String> {
        let raw_key = env::var("WB_ENCRYPTION_KEY")
            .map_err(|_| "WB_ENCRYPTION_KEY environment variable is required".to_string())?;
        let encryption_key = decode_encryption_key(&raw_key)?;

        let storage_root =
            env::var("WB_STORAGE_ROOT").unwrap_or_else(|_| "./data/wb-attachments".to_string());

        let manager_role = env::var("WB_MANAGER_ROLE")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "wb_manager".to_string());

        let default_policy_version =
            env::var("WB_POLICY_VERSION").unwrap_or_else(|_| "1.0".to_string());

        let extra_recipients = split_list(&env::var("WB_NOTIFY_EXTRA_RECIPIENTS").unwrap_or_default());

        Ok(Self {
            encryption_key,
            storage_root,
            manager_role,
            manager_cache_ttl: Duration::from_secs(parse_env(
                "WB_MANAGER_CACHE_TTL_SECS",
                Self::DEFAULT_MANAGER_CACHE_TTL_SECS,
            )?),
            default_policy_version,
            reply_token_ttl_days: parse_env(
                "WB_REPLY_TOKEN_TTL_DAYS",
                Self::DEFAULT_REPLY_TOKEN_TTL_DAYS,
            )?,
            max_attachment_size: parse_env(
                "WB_MAX_ATTACHMENT_SIZE",
                Self::DEFAULT_MAX_ATTACHMENT_SIZE,
            )?,
            retention_months: parse_env("WB_RETENTION_MONTHS", Self::DEFAULT_RETENTION_MONTHS)?,
            ack_reminder_days: parse_env("WB_ACK_REMINDER_DAYS", Self::DEFAULT_ACK_REMINDER_DAYS)?,
            response_reminder_months: parse_env(
                "WB_RESPONSE_REMINDER_MONTHS",
                Self::DEFAULT_RESPONSE_REMINDER_MONTHS,
            )?,
            extra_recipients,
        })
    }
}

impl AntivirusConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let mode = match env::var("AV_MODE")
            .unwrap_or_else(|_| "disabled".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "" | "disabled" => AntivirusMode::Disabled,
            "local" => AntivirusMode::Local,
            other => return Err(format!("AV_MODE must be 'disabled' or 'local', got '{}'", other)),
        };

        let scanner_path = env::var("AV_SCANNER_PATH").unwrap_or_else(|_| "clamscan".to_string());

        Ok(Self {
            mode,
            scanner_path,
            timeout: Duration::from_secs(parse_env("AV_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS)?),
        })
    }
}

impl RateLimitConfig {
    const DEFAULT_REPORTS_MAX: usize = 5;
    const DEFAULT_REPORTS_WINDOW_SECS: u64 = 3600;
    const DEFAULT_MESSAGES_MAX: usize = 20;
    const DEFAULT_MESSAGES_WINDOW_SECS: u64 = 900;

    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            reports_max: parse_env("RATE_LIMIT_REPORTS_MAX", Self::DEFAULT_REPORTS_MAX)?,
            reports_window: Duration::from_secs(parse_env(
                "RATE_LIMIT_REPORTS_WINDOW_SECS",
                Self::DEFAULT_REPORTS_WINDOW_SECS,
            )?),
            messages_max: parse_env("RATE_LIMIT_MESSAGES_MAX", Self::DEFAULT_MESSAGES_MAX)?,
            messages_window: Duration::from_secs(parse_env(
                "RATE_LIMIT_MESSAGES_WINDOW_SECS",
                Self::DEFAULT_MESSAGES_WINDOW_SECS,
            )?),
        })
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            reports_max: Self::DEFAULT_REPORTS_MAX,
            reports_window: Duration::from_secs(Self::DEFAULT_REPORTS_WINDOW_SECS),
            messages_max: Self::DEFAULT_MESSAGES_MAX,
            messages_window: Duration::from_secs(Self::DEFAULT_MESSAGES_WINDOW_SECS),
        }
    }
}

impl SmtpConfig {
    const DEFAULT_PORT: u16 = 587;

    /// Returns `None` when no SMTP host is configured (notifications are logged only)
    pub fn from_env() -> Result<Option<Self>, String> {
        let host = match env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()) {
            Some(host) => host,
            None => return Ok(None),
        };

        let from = env::var("SMTP_FROM")
            .map_err(|_| "SMTP_FROM is required when SMTP_HOST is set".to_string())?;

        Ok(Some(Self {
            host,
            port: parse_env("SMTP_PORT", Self::DEFAULT_PORT)?,
            username: env::var("SMTP_USERNAME").ok().filter(|s| !s.is_empty()),
            password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            from,
        }))
    }
}

impl JobsConfig {
    const DEFAULT_UTC_OFFSET_HOURS: i32 = 1;

    pub fn from_env() -> Result<Self, String> {
        let enabled = parse_bool_env("JOBS_ENABLED", true)?;

        let offset_hours = parse_env("JOBS_UTC_OFFSET_HOURS", Self::DEFAULT_UTC_OFFSET_HOURS)?;
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| "JOBS_UTC_OFFSET_HOURS is out of range".to_string())?;

        let reminder_at = parse_time_of_day(
            &env::var("WB_REMINDER_JOB_AT").unwrap_or_else(|_| "08:00".to_string()),
        )
        .ok_or_else(|| "WB_REMINDER_JOB_AT must be HH:MM".to_string())?;

        let retention_at = parse_time_of_day(
            &env::var("WB_RETENTION_JOB_AT").unwrap_or_else(|_| "03:30".to_string()),
        )
        .ok_or_else(|| "WB_RETENTION_JOB_AT must be HH:MM".to_string())?;

        Ok(Self {
            enabled,
            utc_offset,
            reminder_at,
            retention_at,
        })
    }
}
