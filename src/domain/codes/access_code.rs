//! Member access codes.
//!
//! An access code is a persistent member credential: it is minted for a
//! membership and bound to it at creation, so `is_used` reads as "bound to a
//! member". A bound code always carries `used_at`. Codes are never deleted
//! and expiry is informational only.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccessCodeId, MembershipId, Timestamp, UserId};
use crate::domain::membership::PlanId;

use super::generator::{access_code_remaining_days, is_access_code_expired};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCode {
    pub id: AccessCodeId,
    pub code: String,
    pub user_id: UserId,
    pub membership_id: MembershipId,
    pub plan_id: PlanId,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub used_at: Option<Timestamp>,
    pub is_used: bool,
}

impl AccessCode {
    pub fn is_expired(&self) -> bool {
        is_access_code_expired(&self.expires_at)
    }

    pub fn remaining_days(&self) -> i64 {
        access_code_remaining_days(&self.expires_at)
    }

    /// Binds the code, keeping the first `used_at` if already bound.
    pub fn mark_used(&mut self, at: Timestamp) {
        if !self.is_used || self.used_at.is_none() {
            self.is_used = true;
            self.used_at = Some(self.used_at.unwrap_or(at));
        }
    }
}

/// Input for creating an access code. Storage fills in `id` and `created_at`
/// when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccessCode {
    #[serde(default)]
    pub id: Option<AccessCodeId>,
    pub code: String,
    pub user_id: UserId,
    pub membership_id: MembershipId,
    pub plan_id: PlanId,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    pub expires_at: Timestamp,
    #[serde(default)]
    pub used_at: Option<Timestamp>,
    #[serde(default)]
    pub is_used: bool,
}

impl NewAccessCode {
    /// A code bound to its membership from the moment it is minted.
    pub fn bound(
        code: impl Into<String>,
        user_id: UserId,
        membership_id: MembershipId,
        plan_id: PlanId,
        expires_at: Timestamp,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: None,
            code: code.into(),
            user_id,
            membership_id,
            plan_id,
            created_at: Some(now),
            expires_at,
            used_at: Some(now),
            is_used: true,
        }
    }

    /// Resolves defaults into a stored record. The code is uppercased and a
    /// bound code without `used_at` gets its creation time.
    pub fn into_access_code(self) -> AccessCode {
        let created_at = self.created_at.unwrap_or_else(Timestamp::now);
        let used_at = match (self.is_used, self.used_at) {
            (true, None) => Some(created_at),
            (_, used_at) => used_at,
        };
        AccessCode {
            id: self.id.unwrap_or_default(),
            code: self.code.trim().to_uppercase(),
            user_id: self.user_id,
            membership_id: self.membership_id,
            plan_id: self.plan_id,
            created_at,
            expires_at: self.expires_at,
            is_used: self.is_used || used_at.is_some(),
            used_at,
        }
    }
}
