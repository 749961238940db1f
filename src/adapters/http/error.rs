//! HTTP error mapping.
//!
//! | Error | Status | Code |
//! |-------|--------|------|
//! | NotFoundForUser | 404 | MEMBERSHIP_NOT_FOUND |
//! | InvalidPlan | 400 | INVALID_PLAN |
//! | InvalidDiscountCode | 400 | INVALID_DISCOUNT_CODE |
//! | PaymentFailed | 402 | PAYMENT_FAILED |
//! | InvalidState | 409 | INVALID_STATE_TRANSITION |
//! | InvalidWebhookSignature | 401 | INVALID_WEBHOOK_SIGNATURE |
//! | Forbidden | 403 | FORBIDDEN |
//! | ValidationFailed | 400 | VALIDATION_FAILED |
//! | Infrastructure | 500 | INTERNAL_ERROR |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;
use crate::domain::membership::MembershipError;

/// `{code, message}` body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct MembershipApiError(pub MembershipError);

impl From<MembershipError> for MembershipApiError {
    fn from(err: MembershipError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for MembershipApiError {
    fn from(err: DomainError) -> Self {
        Self(err.into())
    }
}

impl MembershipApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            MembershipError::NotFoundForUser(_) => (StatusCode::NOT_FOUND, "MEMBERSHIP_NOT_FOUND"),
            MembershipError::InvalidPlan(_) => (StatusCode::BAD_REQUEST, "INVALID_PLAN"),
            MembershipError::InvalidDiscountCode { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_DISCOUNT_CODE")
            }
            MembershipError::PaymentFailed { .. } => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED"),
            MembershipError::InvalidState { .. } => {
                (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION")
            }
            MembershipError::InvalidWebhookSignature => {
                (StatusCode::UNAUTHORIZED, "INVALID_WEBHOOK_SIGNATURE")
            }
            MembershipError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            MembershipError::ValidationFailed { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            MembershipError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for MembershipApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self.0, "Request failed");
        }
        (status, Json(ErrorResponse::new(code, self.0.message()))).into_response()
    }
}
