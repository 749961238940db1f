//! Coupon tiers recognized by code prefix.

use serde::{Deserialize, Serialize};

use crate::domain::membership::{PlanId, PlanTier};

/// Discount tier a coupon belongs to, identified by the code's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountTier {
    Basic,
    Premium,
    Elite,
    Referral,
}

impl DiscountTier {
    pub const ALL: [DiscountTier; 4] = [
        DiscountTier::Basic,
        DiscountTier::Premium,
        DiscountTier::Elite,
        DiscountTier::Referral,
    ];

    /// Uppercase code prefix for this tier.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiscountTier::Basic => "BASIC",
            DiscountTier::Premium => "PREMIUM",
            DiscountTier::Elite => "ELITE",
            DiscountTier::Referral => "REFERRAL",
        }
    }

    /// Percentage off the monthly price.
    pub fn percentage(&self) -> i32 {
        match self {
            DiscountTier::Basic => 10,
            DiscountTier::Premium => 20,
            DiscountTier::Elite => 25,
            DiscountTier::Referral => 15,
        }
    }

    /// Resolves the tier of a coupon code by its prefix, case-insensitively.
    pub fn from_code(code: &str) -> Option<DiscountTier> {
        let upper = code.trim().to_uppercase();
        DiscountTier::ALL
            .into_iter()
            .find(|tier| upper.starts_with(tier.prefix()))
    }

    /// Referral coupons apply to every plan; the others only to their own tier.
    pub fn applies_to(&self, plan: PlanId) -> bool {
        match self {
            DiscountTier::Referral => true,
            DiscountTier::Basic => plan.tier() == PlanTier::Basic,
            DiscountTier::Premium => plan.tier() == PlanTier::Premium,
            DiscountTier::Elite => plan.tier() == PlanTier::Elite,
        }
    }
}

impl std::str::FromStr for DiscountTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiscountTier::ALL
            .into_iter()
            .find(|tier| tier.prefix().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid discount tier: {}", s))
    }
}
