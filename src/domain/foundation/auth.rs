//! Authentication types for the domain layer.
//!
//! `SessionUser` is the minimal identity a session source hands back: the
//! user id plus the email the auth backend knows about. Any backend (local
//! pointer file, hosted auth service) can populate it via the `SessionSource`
//! port.

use super::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The currently signed-in user as reported by a session source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The unique user identifier from the auth backend.
    pub id: UserId,

    /// Email address, when the backend exposes one.
    pub email: Option<String>,
}

impl SessionUser {
    /// Creates a new session user.
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self { id, email }
    }
}

/// Authentication errors raised by session sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The access token is missing, malformed, or rejected.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Caller is authenticated but lacks the required role.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// The authentication service is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Reading or writing the local session pointer failed.
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
