//! HTTP endpoint for the relational RPC protocol.
//!
//! `POST /api/db` with `{action, payload}`; replies `{data}` on success and
//! `{error}` otherwise.

pub mod handlers;

use axum::routing::post;
use axum::Router;

use crate::adapters::http::state::AppState;

pub fn rpc_routes() -> Router<AppState> {
    Router::new().route("/db", post(handlers::rpc))
}
