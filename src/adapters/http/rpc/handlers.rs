use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::adapters::http::state::AppState;
use crate::adapters::rpc::{dispatch, RpcRequest, RpcResponse, RPC_SECRET_HEADER};
use crate::domain::foundation::ErrorCode;

fn presents_secret(headers: &HeaderMap, secret: &SecretString) -> bool {
    let Some(presented) = headers.get(RPC_SECRET_HEADER) else {
        return false;
    };
    let expected = secret.expose_secret().as_bytes();
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected))
}

pub async fn rpc(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<RpcResponse>) {
    let Some(endpoint) = state.rpc.as_ref() else {
        return (
            StatusCode::NOT_FOUND,
            Json(RpcResponse::error("Relational RPC endpoint is not enabled")),
        );
    };
    if !presents_secret(&headers, &endpoint.secret) {
        tracing::warn!("RPC call without a valid shared secret");
        return (
            StatusCode::UNAUTHORIZED,
            Json(RpcResponse::error("Unauthorized")),
        );
    }
    let store = &endpoint.store;

    let request: RpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed RPC request");
            return (
                StatusCode::BAD_REQUEST,
                Json(RpcResponse::error(format!("Invalid request: {}", e))),
            );
        }
    };

    let action = request.action();
    match dispatch(store.as_ref(), request).await {
        Ok(data) => {
            tracing::debug!(action, "RPC action served");
            (StatusCode::OK, Json(RpcResponse::data(data)))
        }
        Err(e) => {
            let status = match e.code {
                ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
                ErrorCode::Conflict => StatusCode::CONFLICT,
                ErrorCode::DiscountCodeNotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::warn!(action, error = %e, "RPC action failed");
            (status, Json(RpcResponse::error(e.message().to_string())))
        }
    }
}
