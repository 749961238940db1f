//! Membership confirmation message.
//!
//! Built by the orchestrator after the membership and its access code are
//! persisted, then handed to a `MembershipNotifier`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::pricing::format_price;

use super::PlanId;

/// Everything a welcome email needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipConfirmation {
    pub email: String,
    pub name: String,
    pub plan_id: PlanId,
    /// Name shown to the member, e.g. "Premium Maintenance".
    pub plan_name: String,
    pub access_code: String,
    /// What the member actually pays, after any discount.
    pub monthly_price_cents: i64,
    pub start_date: Timestamp,
}

impl MembershipConfirmation {
    pub fn subject(&self) -> String {
        format!("Welcome to {}!", self.plan_name)
    }

    /// Greeting name, falling back to a generic salutation.
    fn greeting_name(&self) -> &str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            "there"
        } else {
            trimmed
        }
    }

    /// Plain-text body.
    pub fn text_body(&self) -> String {
        format!(
            "Hi {name},\n\n\
             Your {plan} membership is active as of {start}.\n\
             Monthly price: {price}\n\n\
             Your member access code: {code}\n\
             Show this code when booking to receive member pricing.\n",
            name = self.greeting_name(),
            plan = self.plan_name,
            start = self.start_date.to_date_string(),
            price = format_price(self.monthly_price_cents),
            code = self.access_code,
        )
    }

    /// HTML body sent alongside the text version.
    pub fn html_body(&self) -> String {
        format!(
            "<h1>Welcome, {name}!</h1>\
             <p>Your <strong>{plan}</strong> membership is active as of {start}.</p>\
             <p>Monthly price: {price}</p>\
             <p>Your member access code:</p>\
             <p style=\"font-size:24px;font-family:monospace\"><strong>{code}</strong></p>",
            name = self.greeting_name(),
            plan = self.plan_name,
            start = self.start_date.to_date_string(),
            price = format_price(self.monthly_price_cents),
            code = self.access_code,
        )
    }
}
