//! Membership aggregate entity.
//!
//! A membership is one plan enrollment for one user. Rows are never deleted;
//! cancellation flips the status and stamps `end_date`.
//!
//! # Design Decisions
//!
//! - **Money in cents**: plan prices are i64 cents, never floats
//! - **Denormalized code**: `access_code` keeps the code the user signed up with
//! - **Latest wins**: lookups by user pick the most recently updated row

use crate::domain::foundation::{DomainError, ErrorCode, MembershipId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use super::{MembershipStatus, PaymentStatus, PlanId};

/// Days between billing dates.
pub const BILLING_PERIOD_DAYS: i64 = 30;

/// Membership aggregate - one plan enrollment.
///
/// # Invariants
///
/// - `status == Active` implies the owner is treated as a member
/// - `status == Canceled` implies `end_date` is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub status: MembershipStatus,
    pub payment_status: PaymentStatus,

    /// Access code consumed at signup, if any.
    pub access_code: Option<String>,

    pub next_billing_date: Timestamp,
    pub start_date: Timestamp,
    pub end_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Membership {
    /// Starts a new active membership billed from now.
    pub fn start(
        id: MembershipId,
        user_id: UserId,
        plan_id: PlanId,
        payment_status: PaymentStatus,
        consumed_code: Option<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            plan_id,
            status: MembershipStatus::Active,
            payment_status,
            access_code: consumed_code,
            next_billing_date: now.add_days(BILLING_PERIOD_DAYS),
            start_date: now,
            end_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when this row makes its owner a member.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Cancel this membership, stamping the end date.
    ///
    /// # Errors
    ///
    /// Returns error if transition from current status is not allowed.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition_to(MembershipStatus::Canceled)?;
        let now = Timestamp::now();
        self.end_date = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Renew for another billing period.
    pub fn renew(&mut self) -> Result<(), DomainError> {
        self.transition_to(MembershipStatus::Active)?;
        self.next_billing_date = self.next_billing_date.add_days(BILLING_PERIOD_DAYS);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Record a refund of the latest charge. Status is left untouched.
    pub fn mark_refunded(&mut self) {
        self.payment_status = PaymentStatus::Refunded;
        self.updated_at = Timestamp::now();
    }

    fn transition_to(&mut self, target: MembershipStatus) -> Result<(), DomainError> {
        use crate::domain::foundation::StateMachine;

        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(ErrorCode::InvalidStateTransition, target.to_string())
                .with_detail("current", self.status.to_string())
        })?;
        Ok(())
    }
}

/// Picks the most recently updated membership out of a set of rows.
pub fn latest_membership<'a, I>(rows: I) -> Option<&'a Membership>
where
    I: IntoIterator<Item = &'a Membership>,
{
    rows.into_iter().max_by_key(|m| m.updated_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Membership {
        Membership::start(
            MembershipId::new(),
            UserId::new("user-123").unwrap(),
            PlanId::MaintenanceBasic,
            PaymentStatus::Paid,
            None,
        )
    }

    #[test]
    fn start_creates_active_membership_billed_in_30_days() {
        let membership = started();

        assert_eq!(membership.status, MembershipStatus::Active);
        assert!(membership.end_date.is_none());
        assert_eq!(
            membership
                .next_billing_date
                .duration_since(&membership.start_date)
                .num_days(),
            30
        );
    }

    #[test]
    fn start_keeps_consumed_code() {
        let membership = Membership::start(
            MembershipId::new(),
            UserId::new("u").unwrap(),
            PlanId::MaintenanceElite,
            PaymentStatus::Unpaid,
            Some("SIGNUP-AB12CD34".to_string()),
        );
        assert_eq!(membership.access_code.as_deref(), Some("SIGNUP-AB12CD34"));
        assert_eq!(membership.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn cancel_stamps_end_date() {
        let mut membership = started();
        membership.cancel().unwrap();

        assert_eq!(membership.status, MembershipStatus::Canceled);
        assert!(membership.end_date.is_some());
        assert!(!membership.is_active());
    }

    #[test]
    fn cancel_twice_is_rejected() {
        let mut membership = started();
        membership.cancel().unwrap();

        let err = membership.cancel().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn renew_pushes_billing_date() {
        let mut membership = started();
        let before = membership.next_billing_date;
        membership.renew().unwrap();
        assert_eq!(membership.next_billing_date.duration_since(&before).num_days(), 30);
    }

    #[test]
    fn latest_membership_picks_most_recent_update() {
        let older = started();
        let mut newer = started();
        newer.updated_at = older.updated_at.add_days(1);

        let rows = vec![newer.clone(), older];
        assert_eq!(latest_membership(&rows).map(|m| m.id), Some(newer.id));
    }
}
