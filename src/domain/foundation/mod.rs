//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait and error types
//! used across the membership, code and pricing modules.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, SessionUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AccessCodeId, MembershipId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
