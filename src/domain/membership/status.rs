//! Membership status state machine and payment status.
//!
//! Only creation (`(none) -> Active`) and administrative cancel
//! (`Active -> Canceled`) are driven by handlers today. `PastDue` and
//! `Trialing` are representable so rows written by other tools still load.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Membership subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Paid up; the owner counts as a member.
    Active,

    /// Closed by cancellation. `end_date` is stamped.
    Canceled,

    /// Renewal payment failed.
    PastDue,

    /// Trial period before the first charge.
    Trialing,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Canceled => "canceled",
            MembershipStatus::PastDue => "past_due",
            MembershipStatus::Trialing => "trialing",
        }
    }

    /// Only `Active` makes the owning user a member.
    pub fn is_active(&self) -> bool {
        matches!(self, MembershipStatus::Active)
    }
}

impl StateMachine for MembershipStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use MembershipStatus::*;
        matches!(
            (self, target),
            (Trialing, Active)
                | (Trialing, Canceled)
                | (Active, Active) // Renewal
                | (Active, Canceled)
                | (Active, PastDue)
                | (PastDue, Active)
                | (PastDue, Canceled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MembershipStatus::*;
        match self {
            Trialing => vec![Active, Canceled],
            Active => vec![Active, Canceled, PastDue],
            PastDue => vec![Active, Canceled],
            Canceled => vec![],
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MembershipStatus::Active),
            "canceled" => Ok(MembershipStatus::Canceled),
            "past_due" => Ok(MembershipStatus::PastDue),
            "trialing" => Ok(MembershipStatus::Trialing),
            other => Err(format!("Invalid membership status: {}", other)),
        }
    }
}

/// Payment state of a membership's most recent charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Paid,
    Unpaid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("Invalid payment status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_can_be_canceled() {
        assert_eq!(
            MembershipStatus::Active.transition_to(MembershipStatus::Canceled),
            Ok(MembershipStatus::Canceled)
        );
    }

    #[test]
    fn active_can_renew_to_active() {
        assert!(MembershipStatus::Active.can_transition_to(&MembershipStatus::Active));
    }

    #[test]
    fn canceled_is_terminal() {
        assert!(MembershipStatus::Canceled.is_terminal());
        assert!(MembershipStatus::Canceled
            .transition_to(MembershipStatus::Active)
            .is_err());
    }

    #[test]
    fn only_active_counts_as_member() {
        assert!(MembershipStatus::Active.is_active());
        assert!(!MembershipStatus::PastDue.is_active());
        assert!(!MembershipStatus::Trialing.is_active());
        assert!(!MembershipStatus::Canceled.is_active());
    }

    #[test]
    fn valid_transitions_are_consistent_with_can_transition_to() {
        for status in [
            MembershipStatus::Active,
            MembershipStatus::Canceled,
            MembershipStatus::PastDue,
            MembershipStatus::Trialing,
        ] {
            for target in status.valid_transitions() {
                assert!(status.can_transition_to(&target), "{:?} -> {:?}", status, target);
            }
        }
    }

    #[test]
    fn statuses_parse_from_wire_strings() {
        assert_eq!("past_due".parse::<MembershipStatus>(), Ok(MembershipStatus::PastDue));
        assert_eq!("refunded".parse::<PaymentStatus>(), Ok(PaymentStatus::Refunded));
        assert!("cancelled".parse::<MembershipStatus>().is_err());
    }

    #[test]
    fn payment_status_defaults_to_paid() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Paid);
    }
}
