//! Maintenance plans and their fixed monthly prices.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// A subscription plan offered to members.
///
/// Serialized as the kebab-case plan identifier (`maintenance-basic`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanId {
    #[serde(rename = "maintenance-basic")]
    MaintenanceBasic,
    #[serde(rename = "maintenance-premium")]
    MaintenancePremium,
    #[serde(rename = "maintenance-elite")]
    MaintenanceElite,
}

/// Tier a plan belongs to. Discount codes are matched against tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Basic,
    Premium,
    Elite,
}

impl PlanId {
    /// All plans in display order.
    pub const ALL: [PlanId; 3] = [
        PlanId::MaintenanceBasic,
        PlanId::MaintenancePremium,
        PlanId::MaintenanceElite,
    ];

    /// Wire identifier of the plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::MaintenanceBasic => "maintenance-basic",
            PlanId::MaintenancePremium => "maintenance-premium",
            PlanId::MaintenanceElite => "maintenance-elite",
        }
    }

    /// Human-readable plan name used in receipts and emails.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanId::MaintenanceBasic => "Basic Maintenance",
            PlanId::MaintenancePremium => "Premium Maintenance",
            PlanId::MaintenanceElite => "Elite Maintenance",
        }
    }

    /// Monthly price in cents.
    pub fn monthly_price_cents(&self) -> i64 {
        match self {
            PlanId::MaintenanceBasic => 14_999,
            PlanId::MaintenancePremium => 24_999,
            PlanId::MaintenanceElite => 39_999,
        }
    }

    pub fn tier(&self) -> PlanTier {
        match self {
            PlanId::MaintenanceBasic => PlanTier::Basic,
            PlanId::MaintenancePremium => PlanTier::Premium,
            PlanId::MaintenanceElite => PlanTier::Elite,
        }
    }

    /// Looks a plan up by wire identifier, returning `None` for unknown ids.
    pub fn lookup(id: &str) -> Option<PlanId> {
        PlanId::ALL.into_iter().find(|plan| plan.as_str() == id)
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanId::lookup(s)
            .ok_or_else(|| ValidationError::invalid_format("plan_id", format!("unknown plan '{}'", s)))
    }
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Basic => "basic",
            PlanTier::Premium => "premium",
            PlanTier::Elite => "elite",
        }
    }
}
