//! Failures a membership operation reports to its caller.
//!
//! The HTTP adapter owns the status mapping; `Display` is the text that
//! reaches the client.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("No active membership found for user: {0}")]
    NotFoundForUser(UserId),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// `reason` is shown to the buyer as is.
    #[error("{reason}")]
    InvalidDiscountCode { code: String, reason: String },

    #[error("Payment failed: {reason}")]
    PaymentFailed { reason: String },

    #[error("Cannot move membership from {current} to {attempted}")]
    InvalidState { current: String, attempted: String },

    #[error("Invalid webhook signature")]
    InvalidWebhookSignature,

    #[error("Admin access required")]
    Forbidden,

    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// Backend text, passed through.
    #[error("{0}")]
    Infrastructure(String),
}

impl MembershipError {
    pub fn not_found_for_user(user_id: UserId) -> Self {
        Self::NotFoundForUser(user_id)
    }

    pub fn invalid_plan(plan: impl Into<String>) -> Self {
        Self::InvalidPlan(plan.into())
    }

    pub fn invalid_discount_code(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDiscountCode {
            code: code.into(),
            reason: reason.into(),
        }
    }

    pub fn payment_failed(reason: impl Into<String>) -> Self {
        Self::PaymentFailed { reason: reason.into() }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure(message.into())
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<DomainError> for MembershipError {
    fn from(err: DomainError) -> Self {
        let DomainError { code, message, details } = err;
        match code {
            ErrorCode::InvalidStateTransition => Self::InvalidState {
                current: details.get("current").cloned().unwrap_or_else(|| "current".into()),
                attempted: message,
            },
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => Self::ValidationFailed {
                field: details.get("field").cloned().unwrap_or_default(),
                message,
            },
            ErrorCode::PaymentFailed => Self::PaymentFailed { reason: message },
            ErrorCode::Forbidden => Self::Forbidden,
            _ => Self::Infrastructure(message),
        }
    }
}
