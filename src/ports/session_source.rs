//! Session source and token verification ports.
//!
//! `SessionSource` resolves who is signed in on this process. The local
//! development source reads a persisted pointer, the hosted source asks the
//! hosted auth service, and the relational RPC mode has no session at all.
//!
//! `TokenVerifier` resolves the caller of an HTTP request from the bearer
//! token it presents.

use crate::domain::foundation::{AuthError, SessionUser};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Authentication state change pushed by sources that support it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn(SessionUser),
    SignedOut,
}

#[async_trait]
pub trait SessionSource: Send + Sync {
    /// The signed-in user, or `None`.
    async fn current_user(&self) -> Result<Option<SessionUser>, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Auth-change notifications. `None` when the source never pushes.
    fn subscribe(&self) -> Option<broadcast::Receiver<AuthChange>>;
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// The user `token` belongs to.
    ///
    /// # Errors
    ///
    /// `InvalidToken` when the token is unknown, expired or revoked;
    /// `ServiceUnavailable` when the issuer cannot be reached.
    async fn verify(&self, token: &str) -> Result<SessionUser, AuthError>;
}
