//! Routes for the membership API.

use axum::routing::{get, post};
use axum::Router;

use crate::adapters::http::state::AppState;

use super::handlers::{
    cancel_member, create_checkout, create_payment_intent, get_checkout_summary, get_session,
    list_members, stripe_webhook, validate_discount,
};

/// Routes mounted under `/api`.
///
/// - `GET /checkout/summary` - price breakdown for a plan and coupon
/// - `POST /discounts/validate` - stored discount code check
/// - `POST /payments/intent` - charge the first month and create the membership
/// - `POST /payments/checkout` - hosted checkout session
/// - `GET /session` - session snapshot for the caller
/// - `GET /admin/members` - members with access codes (admin)
/// - `POST /admin/members/cancel` - cancel a member (admin)
pub fn membership_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout/summary", get(get_checkout_summary))
        .route("/discounts/validate", post(validate_discount))
        .route("/payments/intent", post(create_payment_intent))
        .route("/payments/checkout", post(create_checkout))
        .route("/session", get(get_session))
        .route("/admin/members", get(list_members))
        .route("/admin/members/cancel", post(cancel_member))
}

/// Webhook routes take the raw body, mounted under `/api/webhooks`.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}
