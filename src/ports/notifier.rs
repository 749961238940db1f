//! Notification port for membership confirmations.

use crate::domain::membership::MembershipConfirmation;
use async_trait::async_trait;
use thiserror::Error;

/// Sends the welcome message after a membership is created.
///
/// Delivery happens outside the persistence boundary; callers never fail
/// a signup because of a notification error.
#[async_trait]
pub trait MembershipNotifier: Send + Sync {
    async fn send_confirmation(
        &self,
        confirmation: &MembershipConfirmation,
    ) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// Network failure or 5xx from the provider.
    #[error("Notification transport failed: {0}")]
    Transport(String),

    /// Provider refused the message (4xx).
    #[error("Notification rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Notifier not configured: {0}")]
    NotConfigured(String),
}

impl NotificationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotificationError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_notifier_is_object_safe() {
        fn _accepts_dyn(_n: &dyn MembershipNotifier) {}
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(NotificationError::Transport("timeout".into()).is_retryable());
        assert!(!NotificationError::Rejected {
            status: 422,
            message: "bad from".into()
        }
        .is_retryable());
        assert!(!NotificationError::NotConfigured("no key".into()).is_retryable());
    }
}
