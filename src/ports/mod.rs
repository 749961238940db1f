//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `store` - Profile, membership, access code and discount code storage
//! - `payment_provider` - Payment intents, checkout sessions, webhooks
//! - `notifier` - Membership confirmation delivery
//! - `session_source` - Who is signed in, and whose bearer token a request carries

mod notifier;
mod payment_provider;
mod session_source;
mod store;

pub use notifier::{MembershipNotifier, NotificationError};
pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, CustomerMetadata, PaymentError, PaymentErrorCode,
    PaymentIntent, PaymentIntentRequest, PaymentIntentStatus, PaymentProvider, WebhookEvent,
    WebhookEventData, WebhookEventType,
};
pub use session_source::{AuthChange, SessionSource, TokenVerifier};
pub use store::{AccessCodeStore, DataStore, DiscountCodeStore, MembershipStore, ProfileStore};
