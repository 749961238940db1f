//! Bearer-token authentication for axum.
//!
//! - `auth_middleware` - resolves `Authorization: Bearer <token>` through the
//!   `TokenVerifier` port and stores the `SessionUser` in request extensions
//! - `RequireAuth` - rejects requests without a verified caller
//! - `OptionalAuth` - anonymous requests pass through as `None`
//!
//! A request without an `Authorization` header continues anonymously; one
//! whose token does not verify is answered with 401 before any handler runs.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::error::ErrorResponse;
use crate::domain::foundation::{AuthError, SessionUser};
use crate::ports::TokenVerifier;

pub type AuthState = Arc<dyn TokenVerifier>;

fn bearer_token(request: &Request) -> Option<Result<&str, AuthRejection>> {
    let value = request.headers().get(AUTHORIZATION)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    Some(token.ok_or(AuthRejection::InvalidToken))
}

pub async fn auth_middleware(
    State(verifier): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        None => return next.run(request).await,
        Some(Err(rejection)) => return rejection.into_response(),
        Some(Ok(token)) => token.to_string(),
    };

    match verifier.verify(&token).await {
        Ok(user) => {
            tracing::debug!(user_id = %user.id, "Caller verified");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(AuthError::ServiceUnavailable(reason)) => {
            tracing::error!(error = %reason, "Token issuer unreachable");
            AuthRejection::ServiceUnavailable.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Bearer token rejected");
            AuthRejection::InvalidToken.into_response()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequireAuth(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<SessionUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<SessionUser>().cloned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Unauthenticated,
    InvalidToken,
    ServiceUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Authentication required",
            ),
            AuthRejection::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid or expired token",
            ),
            AuthRejection::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AUTH_UNAVAILABLE",
                "Authentication service unavailable",
            ),
        };
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
