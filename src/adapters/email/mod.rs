//! Confirmation email delivery.
//!
//! - `resend` - Resend HTTP sender, optionally redirected to a webhook URL
//! - `logging` - local development, logs instead of sending
//! - `retrying` - bounded retry and dead-letter decorator

mod logging;
mod resend;
mod retrying;

pub use logging::LoggingNotifier;
pub use resend::ResendNotifier;
pub use retrying::{DeadLetter, RetryPolicy, RetryingNotifier};
