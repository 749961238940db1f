//! Fixed token table, for local development and tests.
//!
//! Production resolves tokens with the hosted auth service; this verifier
//! only knows the tokens it was built with.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::adapters::memory::{SEED_ADMIN_ID, SEED_MEMBER_ID, SEED_USER_ID};
use crate::domain::foundation::{AuthError, SessionUser, UserId};
use crate::ports::TokenVerifier;

pub const DEV_ADMIN_TOKEN: &str = "dev-admin-token";
pub const DEV_MEMBER_TOKEN: &str = "dev-member-token";
pub const DEV_USER_TOKEN: &str = "dev-user-token";

#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, SessionUser>,
}

impl StaticTokenVerifier {
    /// Rejects every token.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tokens for the seeded in-memory users.
    pub fn seeded() -> Result<Self, AuthError> {
        let mut verifier = Self::empty();
        for (token, id, email) in [
            (DEV_ADMIN_TOKEN, SEED_ADMIN_ID, "admin@example.com"),
            (DEV_MEMBER_TOKEN, SEED_MEMBER_ID, "member@example.com"),
            (DEV_USER_TOKEN, SEED_USER_ID, "user@example.com"),
        ] {
            let id = UserId::new(id).map_err(|_| AuthError::InvalidToken)?;
            verifier = verifier.with_token(token, SessionUser::new(id, Some(email.to_string())));
        }
        Ok(verifier)
    }

    pub fn with_token(mut self, token: impl Into<String>, user: SessionUser) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<SessionUser, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
