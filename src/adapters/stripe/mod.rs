//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port:
//! - Confirmed payment intents for on-site card payments
//! - Hosted checkout sessions
//! - Webhook signature verification
//!
//! `MockPaymentProvider` stands in when no Stripe keys are configured.

mod mock_payment_provider;
mod stripe_adapter;
mod webhook_types;

pub use mock_payment_provider::{
    MockCall, MockPaymentProvider, ACTION_REQUIRED_PAYMENT_METHOD, DECLINED_PAYMENT_METHOD,
};
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
pub use webhook_types::{hex_encode, SignatureHeader, SignatureParseError};
