//! Membership command handlers.

mod cancel_membership;
mod create_membership_with_access_code;
mod get_members_with_access_codes;
mod handle_payment_webhook;
mod require_admin;

pub use cancel_membership::{CancelMembershipCommand, CancelMembershipHandler};
pub use create_membership_with_access_code::{
    CreateMembershipCommand, CreateMembershipResult, CreateMembershipWithAccessCodeHandler,
};
pub use get_members_with_access_codes::{
    GetMembersWithAccessCodesHandler, MemberWithAccessCode, NO_ACCESS_CODE,
};
pub use handle_payment_webhook::{HandlePaymentWebhookHandler, WebhookOutcome};
pub use require_admin::require_admin;
