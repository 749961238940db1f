//! Session source for deployments without an identity layer.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::foundation::{AuthError, SessionUser};
use crate::ports::{AuthChange, SessionSource};

/// Nobody is ever signed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSessionSource;

#[async_trait]
impl SessionSource for NoSessionSource {
    async fn current_user(&self) -> Result<Option<SessionUser>, AuthError> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<AuthChange>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_has_a_user() {
        let source = NoSessionSource;
        assert_eq!(source.current_user().await.unwrap(), None);
        assert!(source.sign_out().await.is_ok());
        assert!(source.subscribe().is_none());
    }
}
