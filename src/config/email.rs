//! Email configuration (Resend)

use serde::Deserialize;

use super::error::ValidationError;
use super::server::is_http_url;

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key; empty means confirmations are only logged
    #[serde(default)]
    pub resend_api_key: String,

    #[serde(default = "default_from_email")]
    pub from_email: String,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Posts confirmations here instead of to Resend
    pub webhook_url: Option<String>,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl EmailConfig {
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Whether anything will actually be sent.
    pub fn is_enabled(&self) -> bool {
        !self.resend_api_key.is_empty() || self.webhook_url.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.resend_api_key.is_empty() && !self.resend_api_key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if let Some(url) = &self.webhook_url {
            if !is_http_url(url) {
                return Err(ValidationError::InvalidUrl("email.webhook_url"));
            }
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            webhook_url: None,
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_from_email() -> String {
    "members@detailing.example.com".to_string()
}

fn default_from_name() -> String {
    "Mobile Detailing".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    200
}
