//! HTTP handlers for membership, discount, payment and session endpoints.

use axum::body::Bytes;
use axum::extract::{Json, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::http::error::MembershipApiError;
use crate::adapters::http::middleware::{OptionalAuth, RequireAuth};
use crate::adapters::http::state::AppState;
use crate::application::handlers::{
    require_admin, CancelMembershipCommand, ProcessPaymentCommand, StartCheckoutCommand,
    ValidateDiscountQuery,
};
use crate::application::SessionSnapshot;
use crate::domain::foundation::{SessionUser, UserId};
use crate::domain::membership::{MembershipError, PlanId};
use crate::domain::pricing::calculate_checkout_summary;

use super::dto::{
    CancelMemberRequest, CheckoutBody, CheckoutSummaryQuery, HealthResponse, PaymentIntentBody,
    ValidateDiscountRequest, WebhookResponse,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

fn parse_plan(plan_id: &str) -> Result<PlanId, MembershipError> {
    PlanId::lookup(plan_id.trim()).ok_or_else(|| MembershipError::invalid_plan(plan_id))
}

/// Email from the body, else the one the token issuer knows.
fn resolve_email(body_email: Option<String>, caller: &SessionUser) -> Result<String, MembershipError> {
    body_email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .or_else(|| caller.email.clone())
        .ok_or_else(|| MembershipError::validation("email", "Email is required"))
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_checkout_summary(
    Query(query): Query<CheckoutSummaryQuery>,
) -> Result<impl IntoResponse, MembershipApiError> {
    let summary = calculate_checkout_summary(&query.plan_id, query.discount_code.as_deref())
        .ok_or_else(|| MembershipError::invalid_plan(&query.plan_id))?;
    Ok(Json(summary))
}

pub async fn validate_discount(
    State(state): State<AppState>,
    Json(request): Json<ValidateDiscountRequest>,
) -> Result<impl IntoResponse, MembershipApiError> {
    let validation = state
        .discount_handler()
        .handle(ValidateDiscountQuery {
            code: request.code,
            plan_id: parse_plan(&request.plan_id)?,
        })
        .await?;
    Ok(Json(validation))
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(body): Json<PaymentIntentBody>,
) -> Result<impl IntoResponse, MembershipApiError> {
    let cmd = ProcessPaymentCommand {
        email: resolve_email(body.email, &caller)?,
        user_id: caller.id,
        name: body.name,
        plan_id: parse_plan(&body.plan_id)?,
        payment_method: body.payment_method,
        discount_code: body.discount_code,
        signup_access_code: body.access_code,
        idempotency_key: body.idempotency_key,
    };

    let result = state.payment_handler().handle(cmd).await?;
    let status = if result.membership.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };
    Ok((status, Json(result)))
}

pub async fn create_checkout(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(body): Json<CheckoutBody>,
) -> Result<impl IntoResponse, MembershipApiError> {
    let cmd = StartCheckoutCommand {
        email: resolve_email(body.email, &caller)?,
        user_id: caller.id,
        name: body.name,
        plan_id: parse_plan(&body.plan_id)?,
        discount_code: body.discount_code,
        success_url: body
            .success_url
            .unwrap_or_else(|| format!("{}/membership/success", state.public_url)),
        cancel_url: body
            .cancel_url
            .unwrap_or_else(|| format!("{}/membership", state.public_url)),
    };

    let result = state.checkout_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, MembershipApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            MembershipError::validation(STRIPE_SIGNATURE_HEADER, "Missing Stripe-Signature header")
        })?;

    let outcome = state.webhooks.handle(&body, signature).await?;
    Ok(Json(WebhookResponse {
        received: true,
        outcome,
    }))
}

pub async fn list_members(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<impl IntoResponse, MembershipApiError> {
    require_admin(state.store.as_ref(), &caller.id).await?;
    Ok(Json(state.members_handler().handle().await))
}

pub async fn cancel_member(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Json(request): Json<CancelMemberRequest>,
) -> Result<impl IntoResponse, MembershipApiError> {
    let user_id = UserId::new(request.user_id)
        .map_err(|e| MembershipError::validation("user_id", e.to_string()))?;

    let membership = state
        .cancel_handler()
        .handle(CancelMembershipCommand {
            admin_id: caller.id,
            user_id,
        })
        .await?;
    Ok(Json(membership))
}

pub async fn get_session(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
) -> impl IntoResponse {
    Json(SessionSnapshot::load(state.store.as_ref(), caller).await)
}
