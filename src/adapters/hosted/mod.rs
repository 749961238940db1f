//! Hosted backend-as-a-service adapters: REST data store and auth session.

mod client;
mod session;
mod store;

pub use client::HostedClient;
pub use session::{HostedSessionSource, HostedTokenVerifier};
pub use store::HostedStore;
