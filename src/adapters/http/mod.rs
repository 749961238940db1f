//! HTTP adapter - axum REST API.
//!
//! - `membership` - checkout, discount, payment, webhook, admin and session endpoints
//! - `rpc` - relational RPC endpoint at `/api/db`
//! - `middleware` - caller identity extractors

pub mod error;
pub mod membership;
pub mod middleware;
pub mod router;
pub mod rpc;
pub mod state;

pub use error::{ErrorResponse, MembershipApiError};
pub use router::{api_router, api_router_with_cors};
pub use state::AppState;
