//! Payment command handlers.

mod process_payment;
mod start_checkout;

pub use process_payment::{ProcessPaymentCommand, ProcessPaymentHandler, ProcessPaymentResult};
pub use start_checkout::{StartCheckoutCommand, StartCheckoutHandler, StartCheckoutResult};

use crate::domain::membership::MembershipError;
use crate::ports::{PaymentError, PaymentErrorCode};

/// Maps a payment provider failure onto the application error.
pub fn payment_error_to_membership(err: PaymentError) -> MembershipError {
    match err.code {
        PaymentErrorCode::CardDeclined | PaymentErrorCode::InsufficientFunds => {
            MembershipError::payment_failed(err.message)
        }
        PaymentErrorCode::InvalidWebhook => MembershipError::InvalidWebhookSignature,
        _ => MembershipError::infrastructure(format!("Payment provider error: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declines_are_payment_failures() {
        let err = payment_error_to_membership(PaymentError::card_declined("Your card was declined."));
        assert_eq!(err, MembershipError::payment_failed("Your card was declined."));
    }

    #[test]
    fn provider_outages_are_infrastructure() {
        let err = payment_error_to_membership(PaymentError::network("timeout"));
        assert!(matches!(err, MembershipError::Infrastructure(_)));
    }
}
