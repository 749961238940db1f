//! Session sources and token verifiers that need no remote service.
//!
//! - `local` - JSON pointer file, used with the in-memory mock backend
//! - `none` - relational RPC mode, which has no identity layer
//! - `tokens` - fixed bearer-token table for development and tests

mod local;
mod none;
mod tokens;

pub use local::LocalSessionSource;
pub use none::NoSessionSource;
pub use tokens::{StaticTokenVerifier, DEV_ADMIN_TOKEN, DEV_MEMBER_TOKEN, DEV_USER_TOKEN};
