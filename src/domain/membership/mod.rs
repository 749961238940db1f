//! Membership domain module.
//!
//! Handles plan enrollment, the membership lifecycle, and payment status.
//!
//! # Module Structure
//!
//! - `plan` - Maintenance plans and their monthly prices
//! - `status` - MembershipStatus state machine and PaymentStatus
//! - `aggregate` - Membership aggregate entity
//! - `confirmation` - Welcome message sent after signup
//! - `errors` - MembershipError

mod aggregate;
mod confirmation;
mod errors;
mod plan;
mod status;

pub use aggregate::{latest_membership, Membership, BILLING_PERIOD_DAYS};
pub use confirmation::MembershipConfirmation;
pub use errors::MembershipError;
pub use plan::{PlanId, PlanTier};
pub use status::{MembershipStatus, PaymentStatus};
