//! Resend email sender.
//!
//! Posts the confirmation as JSON to the Resend `/emails` endpoint with a
//! bearer key. When an email webhook URL is configured, the same payload is
//! posted there instead of to the provider.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::membership::MembershipConfirmation;
use crate::ports::{MembershipNotifier, NotificationError};

const RESEND_EMAILS_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    html: String,
    text: String,
}

pub struct ResendNotifier {
    api_key: Option<SecretString>,
    from: String,
    endpoint: String,
    http_client: reqwest::Client,
}

impl ResendNotifier {
    /// `from` is a full header value such as `Detailing <noreply@example.com>`.
    pub fn new(api_key: Option<SecretString>, from: impl Into<String>) -> Self {
        Self {
            api_key,
            from: from.into(),
            endpoint: RESEND_EMAILS_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Send to `url` instead of the provider.
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(
        &self,
        confirmation: &MembershipConfirmation,
    ) -> Result<reqwest::RequestBuilder, NotificationError> {
        if confirmation.email.trim().is_empty() {
            return Err(NotificationError::Rejected {
                status: 422,
                message: "Recipient email is empty".to_string(),
            });
        }

        let body = ResendEmail {
            from: &self.from,
            to: vec![confirmation.email.trim()],
            subject: confirmation.subject(),
            html: confirmation.html_body(),
            text: confirmation.text_body(),
        };

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        match &self.api_key {
            Some(key) => request = request.bearer_auth(key.expose_secret()),
            None if self.endpoint == RESEND_EMAILS_URL => {
                return Err(NotificationError::NotConfigured(
                    "email API key is not set".to_string(),
                ))
            }
            None => {}
        }
        Ok(request)
    }
}

#[async_trait]
impl MembershipNotifier for ResendNotifier {
    async fn send_confirmation(
        &self,
        confirmation: &MembershipConfirmation,
    ) -> Result<(), NotificationError> {
        let response = self
            .build_request(confirmation)?
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(email = %confirmation.email, plan_id = %confirmation.plan_id, "Confirmation email sent");
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(NotificationError::Transport(format!("{}: {}", status, message)))
        } else {
            Err(NotificationError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}
