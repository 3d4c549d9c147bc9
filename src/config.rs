//! Configuration module for Boerse.

use serde::Deserialize;
use std::path::Path;

use crate::{BoerseError, Result};

/// Minimum decoded length of the cookie signing secret in bytes.
pub const MIN_COOKIE_SECRET_BYTES: usize = 64;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests on shutdown, in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
    /// Timezone for displaying dates (e.g., "Europe/Berlin", "UTC").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    15
}

fn default_shutdown_grace() -> u64 {
    15
}

fn default_timezone() -> String {
    "Europe/Berlin".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
            timezone: default_timezone(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/boerse.sqlite3".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Site presentation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Public base URL used to build links in mails and the feed.
    #[serde(default = "default_site_url")]
    pub url: String,
    /// Title shown in the page header.
    #[serde(default = "default_title_text")]
    pub title_text: String,
    /// Footer text (markdown).
    #[serde(default)]
    pub footer_text: String,
    /// Info text on the index page (markdown).
    #[serde(default)]
    pub info_text: String,
    /// Choices for the posting category field.
    #[serde(default)]
    pub posting_categories: Vec<String>,
    /// Choices for the posting type field.
    #[serde(default)]
    pub posting_types: Vec<String>,
    /// Hex-encoded key for signing flash cookies.
    #[serde(default)]
    pub cookie_secret: String,
}

fn default_site_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_title_text() -> String {
    "Forschungsarbeitbörse".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: default_site_url(),
            title_text: default_title_text(),
            footer_text: String::new(),
            info_text: String::new(),
            posting_categories: Vec::new(),
            posting_types: Vec::new(),
            cookie_secret: String::new(),
        }
    }
}

impl SiteConfig {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Transport security for the SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Upgrade the connection with STARTTLS (required).
    #[default]
    Starttls,
    /// Implicit TLS (SMTPS).
    Tls,
    /// Plain text, for local relays only.
    None,
}

/// Outgoing mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SMTP server host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP server port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP user name (empty disables authentication).
    #[serde(default)]
    pub smtp_user: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Connection security.
    #[serde(default)]
    pub smtp_security: SmtpSecurity,
    /// Sender address of all notification mails.
    #[serde(default)]
    pub mail_from: String,
    /// Address receiving admin review requests.
    #[serde(default)]
    pub admin_email: String,
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_password: String::new(),
            smtp_security: SmtpSecurity::default(),
            mail_from: String::new(),
            admin_email: String::new(),
        }
    }
}

/// Moderation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationConfig {
    /// Patterns of addresses accepted without admin review.
    #[serde(default)]
    pub valid_mail_regexp: Vec<String>,
    /// Patterns of addresses that are rejected outright.
    #[serde(default)]
    pub forbidden_mail_regexp: Vec<String>,
    /// Delay before answering a deny-listed submission, in milliseconds.
    #[serde(default = "default_deny_delay")]
    pub deny_delay_ms: u64,
}

fn default_deny_delay() -> u64 {
    5000
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            valid_mail_regexp: Vec::new(),
            forbidden_mail_regexp: Vec::new(),
            deny_delay_ms: default_deny_delay(),
        }
    }
}

/// Janitor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JanitorConfig {
    /// Whether the reminder task runs.
    #[serde(default = "default_janitor_enabled")]
    pub enabled: bool,
    /// Scan interval in seconds.
    #[serde(default = "default_janitor_interval")]
    pub interval_secs: u64,
    /// Age of an unverified posting before a reminder is sent, in seconds.
    /// Also the minimum gap between two reminders.
    #[serde(default = "default_reminder_after")]
    pub reminder_after_secs: u64,
    /// Maximum number of reminders per posting.
    #[serde(default = "default_max_reminders")]
    pub max_reminders: i64,
}

fn default_janitor_enabled() -> bool {
    true
}

fn default_janitor_interval() -> u64 {
    30
}

fn default_reminder_after() -> u64 {
    86400 // 1 day
}

fn default_max_reminders() -> i64 {
    3
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_janitor_enabled(),
            interval_secs: default_janitor_interval(),
            reminder_after_secs: default_reminder_after(),
            max_reminders: default_max_reminders(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/boerse.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Site presentation.
    #[serde(default)]
    pub site: SiteConfig,
    /// Outgoing mail.
    #[serde(default)]
    pub mail: MailConfig,
    /// Moderation rules.
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Reminder janitor.
    #[serde(default)]
    pub janitor: JanitorConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BoerseError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BoerseError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `BOERSE_SMTP_PASSWORD`: Override the SMTP password
    /// - `BOERSE_COOKIE_SECRET`: Override the cookie signing secret
    pub fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var("BOERSE_SMTP_PASSWORD") {
            if !password.is_empty() {
                self.mail.smtp_password = password;
            }
        }
        if let Ok(secret) = std::env::var("BOERSE_COOKIE_SECRET") {
            if !secret.is_empty() {
                self.site.cookie_secret = secret;
            }
        }
    }

    /// Decode the hex cookie secret.
    pub fn cookie_key_bytes(&self) -> Result<Vec<u8>> {
        if self.site.cookie_secret.is_empty() {
            return Err(BoerseError::Config(
                "cookie_secret must be set. Generate one with --gen-cookie-secret \
                 or set BOERSE_COOKIE_SECRET."
                    .to_string(),
            ));
        }
        let bytes = hex::decode(self.site.cookie_secret.trim())
            .map_err(|e| BoerseError::Config(format!("failed to decode cookie_secret: {e}")))?;
        if bytes.len() < MIN_COOKIE_SECRET_BYTES {
            return Err(BoerseError::Config(format!(
                "cookie_secret must decode to at least {MIN_COOKIE_SECRET_BYTES} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the cookie secret is missing, not hex, or too short
    /// - the site URL is not an absolute http(s) URL
    /// - the sender or admin address is missing
    /// - the display timezone is unknown
    pub fn validate(&self) -> Result<()> {
        self.cookie_key_bytes()?;

        let url = url::Url::parse(&self.site.url)
            .map_err(|e| BoerseError::Config(format!("invalid site url {:?}: {e}", self.site.url)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(BoerseError::Config(format!(
                "site url must use http or https, got {:?}",
                url.scheme()
            )));
        }

        if self.mail.mail_from.is_empty() {
            return Err(BoerseError::Config("mail.mail_from must be set".to_string()));
        }
        if self.mail.admin_email.is_empty() {
            return Err(BoerseError::Config("mail.admin_email must be set".to_string()));
        }

        if self.server.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(BoerseError::Config(format!(
                "unknown timezone {:?}",
                self.server.timezone
            )));
        }

        Ok(())
    }
}
