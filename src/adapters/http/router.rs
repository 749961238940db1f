//! Router assembly.

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::membership::handlers::health;
use super::middleware::auth_middleware;
use super::membership::{membership_routes, webhook_routes};
use super::rpc::rpc_routes;
use super::state::AppState;

/// Full API router with CORS for any origin.
pub fn api_router(state: AppState) -> Router {
    api_router_with_cors(state, CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

/// Full API router.
///
/// `/health` sits outside the timeout layer so probes always answer. The
/// RPC route authenticates with its shared secret instead of bearer tokens.
pub fn api_router_with_cors(state: AppState, cors: CorsLayer) -> Router {
    let user_facing = Router::new()
        .merge(membership_routes())
        .nest("/webhooks", webhook_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.tokens.clone(),
            auth_middleware,
        ));
    let api = Router::new().merge(user_facing).merge(rpc_routes());

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(TimeoutLayer::new(state.request_timeout));

    Router::new()
        .nest("/api", api)
        .layer(middleware)
        .route("/health", get(health))
        .with_state(state)
}
