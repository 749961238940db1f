//! Storage ports.
//!
//! One async CRUD surface over the four collections, split per collection
//! and combined into `DataStore`. Every backend (in-memory, relational RPC
//! client, hosted REST, Postgres) implements all four.
//!
//! # Error contract
//!
//! Backend failures surface as `DomainError` carrying the backend's own
//! message unchanged. Stores do not retry and do not translate beyond
//! wrapping. Missing rows on lookups are `Ok(None)`; missing rows on
//! mutations are the matching `*NotFound` code.

use crate::domain::codes::{AccessCode, DiscountCode, DiscountCodeUpdate, NewAccessCode};
use crate::domain::foundation::{AccessCodeId, DomainError, MembershipId, UserId};
use crate::domain::membership::Membership;
use crate::domain::profile::Profile;
use async_trait::async_trait;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError>;

    /// Insert or replace by `user_id`. Last write wins.
    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, DomainError>;

    async fn list_profiles(&self) -> Result<Vec<Profile>, DomainError>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Most recently updated membership for the user, any status.
    async fn get_membership(&self, user_id: &UserId) -> Result<Option<Membership>, DomainError>;

    /// Most recently updated `active` membership for the user.
    async fn get_active_membership(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Membership>, DomainError>;

    /// Insert or replace by membership id.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` when the owning profile is missing and the backend
    ///   enforces the foreign key
    async fn upsert_membership(&self, membership: &Membership) -> Result<Membership, DomainError>;

    async fn list_memberships(&self) -> Result<Vec<Membership>, DomainError>;

    async fn list_active_memberships(&self) -> Result<Vec<Membership>, DomainError>;
}

#[async_trait]
pub trait AccessCodeStore: Send + Sync {
    /// Persist a new code, assigning `id` and `created_at` when absent.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the code string already exists
    async fn create_access_code(&self, code: NewAccessCode) -> Result<AccessCode, DomainError>;

    async fn get_access_code(&self, code: &str) -> Result<Option<AccessCode>, DomainError>;

    async fn get_access_code_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Option<AccessCode>, DomainError>;

    async fn list_access_codes_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AccessCode>, DomainError>;

    async fn list_access_codes(&self) -> Result<Vec<AccessCode>, DomainError>;

    /// Set `is_used` and stamp `used_at`.
    ///
    /// # Errors
    ///
    /// - `AccessCodeNotFound` if no code has this id
    async fn mark_access_code_used(&self, id: &AccessCodeId) -> Result<AccessCode, DomainError>;
}

#[async_trait]
pub trait DiscountCodeStore: Send + Sync {
    /// # Errors
    ///
    /// - `Conflict` if the code already exists
    async fn create_discount_code(&self, code: &DiscountCode) -> Result<DiscountCode, DomainError>;

    /// Lookup by code; callers pass the uppercase form.
    async fn get_discount_code(&self, code: &str) -> Result<Option<DiscountCode>, DomainError>;

    async fn list_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError>;

    /// Codes that are active and not expired.
    async fn list_active_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError>;

    /// Apply a partial update; absent fields keep their stored value.
    async fn update_discount_code(
        &self,
        code: &str,
        update: &DiscountCodeUpdate,
    ) -> Result<DiscountCode, DomainError>;

    /// Atomically add one to `current_uses`.
    ///
    /// Implementations must not read-then-write without a guard: a single
    /// SQL increment, a single write lock, or a compare-and-retry loop.
    ///
    /// # Errors
    ///
    /// - `DiscountCodeNotFound` if no such code
    async fn increment_discount_code_uses(&self, code: &str) -> Result<DiscountCode, DomainError>;
}

/// The full storage surface.
pub trait DataStore: ProfileStore + MembershipStore + AccessCodeStore + DiscountCodeStore {}

impl<T> DataStore for T where T: ProfileStore + MembershipStore + AccessCodeStore + DiscountCodeStore
{}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_traits_are_object_safe() {
        fn _profiles(_s: &dyn ProfileStore) {}
        fn _memberships(_s: &dyn MembershipStore) {}
        fn _access(_s: &dyn AccessCodeStore) {}
        fn _discounts(_s: &dyn DiscountCodeStore) {}
        fn _all(_s: &dyn DataStore) {}
    }
}
