use monitor_core::config::{self as core_config, get_env, get_env_flag, get_env_parsed};
use monitor_core::error::AppError;
use secrecy::Secret;
use std::time::Duration;

use crate::services::DEFAULT_MAX_PAGES;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub common: core_config::Config,
    pub api: ApiConfig,
    pub mail: MailConfig,
    pub smtp: SmtpConfig,
    /// Print the alert instead of emailing it.
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub workspace: String,
    pub username: String,
    pub app_password: Secret<String>,
    pub timeout: Duration,
    pub max_pages: u32,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub charset: String,
}

impl MonitorConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_env(common)
    }

    /// Build from process environment variables on top of an already loaded common config.
    pub fn from_env(common: core_config::Config) -> Result<Self, AppError> {
        let debug = get_env_flag("DEBUG");

        let recipients = parse_recipients(&get_env("MAIL_RECIPIENTS", None)?);
        if recipients.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MAIL_RECIPIENTS does not contain any address"
            )));
        }

        // Credentials only matter when mail is actually sent.
        let smtp_default = if debug { Some("") } else { None };

        Ok(MonitorConfig {
            common,
            api: ApiConfig {
                base_url: get_env("API_BASE_URL", None)?,
                workspace: get_env("API_WORKSPACE", None)?,
                username: get_env("API_USERNAME", None)?,
                app_password: Secret::new(get_env("API_APP_PASSWORD", None)?),
                timeout: Duration::from_secs(get_env_parsed("API_TIMEOUT_SECS", 10)?),
                max_pages: get_env_parsed("API_MAX_PAGES", DEFAULT_MAX_PAGES)?,
            },
            mail: MailConfig {
                from_address: get_env("MAIL_FROM_ADDRESS", None)?,
                recipients,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("email-smtp.us-east-1.amazonaws.com"))?,
                port: get_env_parsed("SMTP_PORT", 587)?,
                user: get_env("SMTP_USER", smtp_default)?,
                password: Secret::new(get_env("SMTP_PASSWORD", smtp_default)?),
                charset: get_env("MAIL_CHARSET", Some("UTF-8"))?,
            },
            debug,
        })
    }
}

/// Split a recipient list on whitespace and commas, dropping empty entries.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}
