//! HTTP middleware for axum.
//!
//! - `auth` - Bearer-token verification and caller extractors

pub mod auth;

pub use auth::{auth_middleware, AuthRejection, AuthState, OptionalAuth, RequireAuth};
