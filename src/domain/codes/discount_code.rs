//! Promotional discount codes.
//!
//! A discount code is keyed by its uppercase code string and scoped either
//! to one plan or to every plan (`all`). It is redeemable while active,
//! unexpired, under its use limit and matching the plan. Codes are never
//! deleted; they are deactivated instead.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, ValidationError};
use crate::domain::membership::PlanId;

/// Which plans a discount code covers. Serialized as `"all"` or a plan id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlanScope {
    All,
    Plan(PlanId),
}

impl PlanScope {
    pub fn covers(&self, plan: PlanId) -> bool {
        match self {
            PlanScope::All => true,
            PlanScope::Plan(scoped) => *scoped == plan,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanScope::All => "all",
            PlanScope::Plan(plan) => plan.as_str(),
        }
    }
}

impl TryFrom<String> for PlanScope {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for PlanScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(PlanScope::All)
        } else {
            s.parse::<PlanId>().map(PlanScope::Plan)
        }
    }
}

impl From<PlanScope> for String {
    fn from(scope: PlanScope) -> Self {
        scope.as_str().to_string()
    }
}

impl fmt::Display for PlanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a stored discount code cannot be redeemed.
///
/// Checks run in declaration order; the first failing one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountRejection {
    NotFound,
    Inactive,
    Expired,
    LimitReached,
    PlanMismatch,
}

impl DiscountRejection {
    /// User-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            DiscountRejection::NotFound => "Invalid discount code",
            DiscountRejection::Inactive => "Discount code is no longer active",
            DiscountRejection::Expired => "Discount code has expired",
            DiscountRejection::LimitReached => "Discount code limit reached",
            DiscountRejection::PlanMismatch => "Discount code is not valid for this plan",
        }
    }
}

impl fmt::Display for DiscountRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    pub plan_id: PlanScope,
    pub discount_percentage: i32,
    #[serde(default)]
    pub description: String,
    pub max_uses: i32,
    #[serde(default)]
    pub current_uses: i32,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub is_active: bool,
}

impl DiscountCode {
    /// Creates an active, unused code.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the code is blank
    /// - `OutOfRange` if the percentage is outside 0-100 or `max_uses` is negative
    pub fn new(
        code: &str,
        plan_id: PlanScope,
        discount_percentage: i32,
        description: impl Into<String>,
        max_uses: i32,
        expires_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(ValidationError::empty_field("code"));
        }
        if !(0..=100).contains(&discount_percentage) {
            return Err(ValidationError::out_of_range(
                "discount_percentage",
                0,
                100,
                i64::from(discount_percentage),
            ));
        }
        if max_uses < 0 {
            return Err(ValidationError::out_of_range(
                "max_uses",
                0,
                i64::from(i32::MAX),
                i64::from(max_uses),
            ));
        }

        Ok(Self {
            code,
            plan_id,
            discount_percentage,
            description: description.into(),
            max_uses,
            current_uses: 0,
            created_at: Timestamp::now(),
            expires_at,
            is_active: true,
        })
    }

    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        self.expires_at.is_before(now)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_uses >= self.max_uses
    }

    /// Active and not expired; the listing filter for "active" codes.
    pub fn is_live_at(&self, now: &Timestamp) -> bool {
        self.is_active && !self.is_expired_at(now)
    }

    /// Checks every redemption rule for `plan` at `now`.
    pub fn check_redeemable(
        &self,
        plan: PlanId,
        now: &Timestamp,
    ) -> Result<(), DiscountRejection> {
        if !self.is_active {
            return Err(DiscountRejection::Inactive);
        }
        if self.is_expired_at(now) {
            return Err(DiscountRejection::Expired);
        }
        if self.is_exhausted() {
            return Err(DiscountRejection::LimitReached);
        }
        if !self.plan_id.covers(plan) {
            return Err(DiscountRejection::PlanMismatch);
        }
        Ok(())
    }
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<PlanScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl DiscountCodeUpdate {
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, code: &mut DiscountCode) {
        if let Some(plan_id) = self.plan_id {
            code.plan_id = plan_id;
        }
        if let Some(pct) = self.discount_percentage {
            code.discount_percentage = pct;
        }
        if let Some(description) = &self.description {
            code.description = description.clone();
        }
        if let Some(max_uses) = self.max_uses {
            code.max_uses = max_uses;
        }
        if let Some(expires_at) = self.expires_at {
            code.expires_at = expires_at;
        }
        if let Some(is_active) = self.is_active {
            code.is_active = is_active;
        }
    }
}

/// Codes are keyed uppercase with surrounding whitespace removed.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
