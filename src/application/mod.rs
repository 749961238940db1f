//! Application layer - command handlers and session state.
//!
//! Orchestrates domain operations across the store, payment, notification
//! and session ports.

pub mod handlers;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use handlers::{
    CreateMembershipCommand, CreateMembershipResult, CreateMembershipWithAccessCodeHandler,
    DiscountValidation, ValidateAndGetDiscountHandler,
};
pub use session::{SessionContext, SessionSnapshot};
