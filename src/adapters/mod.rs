//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - seeded in-memory store (local development, tests)
//! - `rpc` - relational RPC client, wire protocol and server-side dispatch
//! - `postgres` - PostgreSQL store behind the RPC endpoint
//! - `hosted` - hosted backend-as-a-service store and auth session
//! - `session` - file-backed and empty session sources, development tokens
//! - `stripe` - payment provider
//! - `email` - confirmation delivery
//! - `http` - axum routes

mod backend;

pub mod email;
pub mod hosted;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod rpc;
pub mod session;
pub mod stripe;

pub use backend::{backend_kind, select_backend, Backend, BackendKind};
