//! Notifier that only logs; used when no email provider is configured.

use async_trait::async_trait;

use crate::domain::membership::MembershipConfirmation;
use crate::ports::{MembershipNotifier, NotificationError};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl MembershipNotifier for LoggingNotifier {
    async fn send_confirmation(
        &self,
        confirmation: &MembershipConfirmation,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            email = %confirmation.email,
            plan_id = %confirmation.plan_id,
            access_code = %confirmation.access_code,
            subject = %confirmation.subject(),
            "Membership confirmation (not sent, logging notifier)"
        );
        Ok(())
    }
}
