//! In-memory data store.
//!
//! Backs local development and tests. All four collections live behind one
//! `RwLock`, so every mutation (including the discount-use increment) runs
//! under a single write guard.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::codes::{
    normalize_code, AccessCode, DiscountCode, DiscountCodeUpdate, NewAccessCode, PlanScope,
};
use crate::domain::foundation::{
    AccessCodeId, DomainError, ErrorCode, MembershipId, Timestamp, UserId,
};
use crate::domain::membership::{latest_membership, Membership, PaymentStatus, PlanId};
use crate::domain::profile::{Profile, Role};
use crate::ports::{AccessCodeStore, DiscountCodeStore, MembershipStore, ProfileStore};

/// User ids of the seeded demo accounts.
pub const SEED_ADMIN_ID: &str = "mock-admin";
pub const SEED_USER_ID: &str = "mock-user";
pub const SEED_MEMBER_ID: &str = "mock-member";
pub const SEED_MEMBER_ACCESS_CODE: &str = "MEM-DEMO2024";

#[derive(Debug, Default)]
struct MemoryState {
    profiles: HashMap<UserId, Profile>,
    memberships: HashMap<MembershipId, Membership>,
    access_codes: HashMap<AccessCodeId, AccessCode>,
    discount_codes: HashMap<String, DiscountCode>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with one admin, one plain user, one active member
    /// holding an access code, and two sample discount codes.
    pub fn seeded() -> Result<Self, DomainError> {
        let now = Timestamp::now();
        let mut state = MemoryState::default();

        let admin = seed_user(SEED_ADMIN_ID, "admin@example.com")?.with_role(Role::Admin);
        let user = seed_user(SEED_USER_ID, "user@example.com")?;
        let member =
            seed_user(SEED_MEMBER_ID, "member@example.com")?.with_marketing_opt_in(true);

        let membership = Membership::start(
            MembershipId::new(),
            member.user_id.clone(),
            PlanId::MaintenancePremium,
            PaymentStatus::Paid,
            None,
        );
        let access_code = NewAccessCode::bound(
            SEED_MEMBER_ACCESS_CODE,
            member.user_id.clone(),
            membership.id,
            membership.plan_id,
            now.add_days(365),
        )
        .into_access_code();

        let welcome = DiscountCode {
            code: "WELCOME10".to_string(),
            plan_id: PlanScope::All,
            discount_percentage: 10,
            description: "10% off any plan for new members".to_string(),
            max_uses: 100,
            current_uses: 0,
            created_at: now,
            expires_at: now.add_days(90),
            is_active: true,
        };
        let premium = DiscountCode {
            code: "PREMIUM20".to_string(),
            plan_id: PlanScope::Plan(PlanId::MaintenancePremium),
            discount_percentage: 20,
            description: "20% off the premium plan".to_string(),
            max_uses: 50,
            current_uses: 0,
            created_at: now,
            expires_at: now.add_days(30),
            is_active: true,
        };

        for profile in [admin, user, member] {
            state.profiles.insert(profile.user_id.clone(), profile);
        }
        state.memberships.insert(membership.id, membership);
        state.access_codes.insert(access_code.id, access_code);
        for code in [welcome, premium] {
            state.discount_codes.insert(code.code.clone(), code);
        }

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
        })
    }
}

fn seed_user(id: &str, email: &str) -> Result<Profile, DomainError> {
    Ok(Profile::new(UserId::new(id)?, Some(email.to_string())))
}

fn sorted_by_creation<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> Timestamp,
{
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        Ok(self.state.read().await.profiles.get(user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, DomainError> {
        let mut state = self.state.write().await;
        state
            .profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(profile.clone())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, DomainError> {
        let rows = self.state.read().await.profiles.values().cloned().collect();
        Ok(sorted_by_creation(rows, |p: &Profile| p.created_at))
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn get_membership(&self, user_id: &UserId) -> Result<Option<Membership>, DomainError> {
        let state = self.state.read().await;
        Ok(latest_membership(
            state.memberships.values().filter(|m| &m.user_id == user_id),
        )
        .cloned())
    }

    async fn get_active_membership(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Membership>, DomainError> {
        let state = self.state.read().await;
        Ok(latest_membership(
            state
                .memberships
                .values()
                .filter(|m| &m.user_id == user_id && m.is_active()),
        )
        .cloned())
    }

    async fn upsert_membership(&self, membership: &Membership) -> Result<Membership, DomainError> {
        let mut state = self.state.write().await;
        state.memberships.insert(membership.id, membership.clone());
        Ok(membership.clone())
    }

    async fn list_memberships(&self) -> Result<Vec<Membership>, DomainError> {
        let rows = self.state.read().await.memberships.values().cloned().collect();
        Ok(sorted_by_creation(rows, |m: &Membership| m.created_at))
    }

    async fn list_active_memberships(&self) -> Result<Vec<Membership>, DomainError> {
        let rows = self
            .state
            .read()
            .await
            .memberships
            .values()
            .filter(|m| m.is_active())
            .cloned()
            .collect();
        Ok(sorted_by_creation(rows, |m: &Membership| m.created_at))
    }
}

#[async_trait]
impl AccessCodeStore for InMemoryStore {
    async fn create_access_code(&self, code: NewAccessCode) -> Result<AccessCode, DomainError> {
        let record = code.into_access_code();
        let mut state = self.state.write().await;

        if state.access_codes.values().any(|c| c.code == record.code) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Access code {} already exists", record.code),
            ));
        }
        state.access_codes.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_access_code(&self, code: &str) -> Result<Option<AccessCode>, DomainError> {
        let code = normalize_code(code);
        let state = self.state.read().await;
        Ok(state.access_codes.values().find(|c| c.code == code).cloned())
    }

    async fn get_access_code_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Option<AccessCode>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .access_codes
            .values()
            .filter(|c| &c.membership_id == membership_id)
            .min_by_key(|c| c.created_at)
            .cloned())
    }

    async fn list_access_codes_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AccessCode>, DomainError> {
        let rows = self
            .state
            .read()
            .await
            .access_codes
            .values()
            .filter(|c| &c.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(rows, |c: &AccessCode| c.created_at))
    }

    async fn list_access_codes(&self) -> Result<Vec<AccessCode>, DomainError> {
        let rows = self.state.read().await.access_codes.values().cloned().collect();
        Ok(sorted_by_creation(rows, |c: &AccessCode| c.created_at))
    }

    async fn mark_access_code_used(&self, id: &AccessCodeId) -> Result<AccessCode, DomainError> {
        let mut state = self.state.write().await;
        let code = state.access_codes.get_mut(id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::AccessCodeNotFound,
                format!("Access code not found: {}", id),
            )
        })?;
        code.mark_used(Timestamp::now());
        Ok(code.clone())
    }
}

#[async_trait]
impl DiscountCodeStore for InMemoryStore {
    async fn create_discount_code(&self, code: &DiscountCode) -> Result<DiscountCode, DomainError> {
        let mut record = code.clone();
        record.code = normalize_code(&record.code);

        let mut state = self.state.write().await;
        if state.discount_codes.contains_key(&record.code) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Discount code {} already exists", record.code),
            ));
        }
        state
            .discount_codes
            .insert(record.code.clone(), record.clone());
        Ok(record)
    }

    async fn get_discount_code(&self, code: &str) -> Result<Option<DiscountCode>, DomainError> {
        let code = normalize_code(code);
        Ok(self.state.read().await.discount_codes.get(&code).cloned())
    }

    async fn list_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError> {
        let rows = self.state.read().await.discount_codes.values().cloned().collect();
        Ok(sorted_by_creation(rows, |c: &DiscountCode| c.created_at))
    }

    async fn list_active_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError> {
        let now = Timestamp::now();
        let rows = self
            .state
            .read()
            .await
            .discount_codes
            .values()
            .filter(|c| c.is_live_at(&now))
            .cloned()
            .collect();
        Ok(sorted_by_creation(rows, |c: &DiscountCode| c.created_at))
    }

    async fn update_discount_code(
        &self,
        code: &str,
        update: &DiscountCodeUpdate,
    ) -> Result<DiscountCode, DomainError> {
        let code = normalize_code(code);
        let mut state = self.state.write().await;
        let record = state
            .discount_codes
            .get_mut(&code)
            .ok_or_else(|| discount_not_found(&code))?;
        update.apply_to(record);
        Ok(record.clone())
    }

    async fn increment_discount_code_uses(&self, code: &str) -> Result<DiscountCode, DomainError> {
        let code = normalize_code(code);
        let mut state = self.state.write().await;
        let record = state
            .discount_codes
            .get_mut(&code)
            .ok_or_else(|| discount_not_found(&code))?;
        record.current_uses += 1;
        Ok(record.clone())
    }
}

fn discount_not_found(code: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DiscountCodeNotFound,
        format!("Discount code not found: {}", code),
    )
}
