//! Card processor seam.
//!
//! The service never touches card data. It sends an amount, a payment method
//! token and the buyer's metadata, then reads back a status. Metadata is what
//! lets a webhook rebuild the membership later, so every charge carries it.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{UserId, ValidationError};
use crate::domain::membership::PlanId;

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Charges `payment_method` right away.
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Opens a hosted checkout page.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Checks `signature` against the raw body, then decodes the event.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerMetadata {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub plan_id: PlanId,
    pub discount_code: Option<String>,
}

impl CustomerMetadata {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = [
            ("user_id", self.user_id.to_string()),
            ("email", self.email.clone()),
            ("name", self.name.clone()),
            ("plan_id", self.plan_id.to_string()),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();

        if let Some(code) = &self.discount_code {
            pairs.push(("discount_code".to_string(), code.clone()));
        }
        pairs
    }

    /// Reads the map a processor echoes back. A blank discount code is
    /// treated as none; a present one is normalized to upper case.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let required = |key: &'static str| {
            map.get(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ValidationError::empty_field(key))
        };

        let user_id = UserId::new(required("user_id")?.clone())?;
        let plan_id: PlanId = required("plan_id")?.parse()?;
        let discount_code = map
            .get("discount_code")
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty());

        Ok(Self {
            user_id,
            email: map.get("email").cloned().unwrap_or_default(),
            name: map.get("name").cloned().unwrap_or_default(),
            plan_id,
            discount_code,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    /// Post-discount cents.
    pub amount_cents: i64,
    pub currency: String,
    pub payment_method: String,
    pub customer: CustomerMetadata,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Succeeded,
    Failed,
    RequiresAction,
}

impl PaymentIntentStatus {
    /// Unknown statuses map to `Failed`.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "succeeded" => Self::Succeeded,
            "requires_action" | "requires_confirmation" | "processing" => Self::RequiresAction,
            _ => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    pub customer: CustomerMetadata,
    /// First month, post-discount cents.
    pub amount_cents: i64,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// A verified processor notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: WebhookEventType,
    pub data: WebhookEventData,
    /// Unix seconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    CheckoutSessionCompleted,
    CheckoutSessionAsyncPaymentSucceeded,
    CheckoutSessionAsyncPaymentFailed,
    ChargeRefunded,
    Unknown(String),
}

impl WebhookEventType {
    pub fn from_provider(event_type: &str) -> Self {
        match event_type {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "checkout.session.async_payment_succeeded" => {
                Self::CheckoutSessionAsyncPaymentSucceeded
            }
            "checkout.session.async_payment_failed" => Self::CheckoutSessionAsyncPaymentFailed,
            "charge.refunded" => Self::ChargeRefunded,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebhookEventData {
    Checkout {
        session_id: String,
        payment_status: Option<String>,
        /// Total charged, in cents.
        #[serde(default)]
        amount_total: Option<i64>,
        metadata: HashMap<String, String>,
    },
    Charge {
        charge_id: String,
        payment_intent_id: Option<String>,
        amount_refunded: i64,
        metadata: HashMap<String, String>,
    },
    /// Event types this service ignores, kept as the original JSON.
    Raw { json: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    NetworkError,
    AuthenticationError,
    CardDeclined,
    InsufficientFunds,
    InvalidRequest,
    RateLimitExceeded,
    InvalidWebhook,
    ProviderError,
}

impl PaymentErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::RateLimitExceeded)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::AuthenticationError => "authentication_error",
            Self::CardDeclined => "card_declined",
            Self::InsufficientFunds => "insufficient_funds",
            Self::InvalidRequest => "invalid_request",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::InvalidWebhook => "invalid_webhook",
            Self::ProviderError => "provider_error",
        }
    }
}

impl fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    /// Processor's own decline or error code, e.g. `card_declined`.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(self, provider_code: impl Into<String>) -> Self {
        Self {
            provider_code: Some(provider_code.into()),
            ..self
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn card_declined(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::CardDeclined, message)
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidWebhook, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}
