//! Request and response bodies for the membership endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::WebhookOutcome;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSummaryQuery {
    pub plan_id: String,
    #[serde(default)]
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateDiscountRequest {
    pub code: String,
    pub plan_id: String,
}

/// Card payment for the first month.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentBody {
    pub plan_id: String,
    pub payment_method: String,
    /// Falls back to the verified caller's email.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub discount_code: Option<String>,
    /// Access code entered at signup.
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutBody {
    pub plan_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub discount_code: Option<String>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelMemberRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
    #[serde(flatten)]
    pub outcome: WebhookOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
