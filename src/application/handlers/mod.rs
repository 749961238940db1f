//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod discount;
pub mod membership;
pub mod payment;

pub use discount::{DiscountValidation, ValidateAndGetDiscountHandler, ValidateDiscountQuery};
pub use membership::{
    require_admin, CancelMembershipCommand, CancelMembershipHandler, CreateMembershipCommand,
    CreateMembershipResult, CreateMembershipWithAccessCodeHandler,
    GetMembersWithAccessCodesHandler, HandlePaymentWebhookHandler, MemberWithAccessCode,
    WebhookOutcome,
};
pub use payment::{
    ProcessPaymentCommand, ProcessPaymentHandler, ProcessPaymentResult, StartCheckoutCommand,
    StartCheckoutHandler, StartCheckoutResult,
};
