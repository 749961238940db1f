//! Doubles for handler tests: the seeded in-memory store with switchable
//! failures, and a notifier that keeps what it was asked to send.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::adapters::memory::InMemoryStore;
use crate::domain::codes::{AccessCode, DiscountCode, DiscountCodeUpdate, NewAccessCode};
use crate::domain::foundation::{AccessCodeId, DomainError, MembershipId, UserId};
use crate::domain::membership::{Membership, MembershipConfirmation};
use crate::domain::profile::Profile;
use crate::ports::{
    AccessCodeStore, DiscountCodeStore, MembershipNotifier, MembershipStore, NotificationError,
    ProfileStore,
};

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<MembershipConfirmation>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<MembershipConfirmation> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MembershipNotifier for RecordingNotifier {
    async fn send_confirmation(
        &self,
        confirmation: &MembershipConfirmation,
    ) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(confirmation.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_access_code_create: AtomicBool,
    pub fail_reads: AtomicBool,
    pub fail_increment: AtomicBool,
}

impl FlakyStore {
    pub fn seeded() -> Self {
        Self {
            inner: InMemoryStore::seeded().unwrap(),
            ..Default::default()
        }
    }

    pub fn fail_access_code_create(&self) {
        self.fail_access_code_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_increment(&self) {
        self.fail_increment.store(true, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), DomainError> {
        if flag.load(Ordering::SeqCst) {
            Err(DomainError::database(format!("simulated {} failure", what)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProfileStore for FlakyStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get_profile(user_id).await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, DomainError> {
        self.inner.upsert_profile(profile).await
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.list_profiles().await
    }
}

#[async_trait]
impl MembershipStore for FlakyStore {
    async fn get_membership(&self, user_id: &UserId) -> Result<Option<Membership>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get_membership(user_id).await
    }

    async fn get_active_membership(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Membership>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get_active_membership(user_id).await
    }

    async fn upsert_membership(&self, membership: &Membership) -> Result<Membership, DomainError> {
        self.inner.upsert_membership(membership).await
    }

    async fn list_memberships(&self) -> Result<Vec<Membership>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.list_memberships().await
    }

    async fn list_active_memberships(&self) -> Result<Vec<Membership>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.list_active_memberships().await
    }
}

#[async_trait]
impl AccessCodeStore for FlakyStore {
    async fn create_access_code(&self, code: NewAccessCode) -> Result<AccessCode, DomainError> {
        Self::check(&self.fail_access_code_create, "access code insert")?;
        self.inner.create_access_code(code).await
    }

    async fn get_access_code(&self, code: &str) -> Result<Option<AccessCode>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get_access_code(code).await
    }

    async fn get_access_code_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Option<AccessCode>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get_access_code_by_membership(membership_id).await
    }

    async fn list_access_codes_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AccessCode>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.list_access_codes_by_user(user_id).await
    }

    async fn list_access_codes(&self) -> Result<Vec<AccessCode>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.list_access_codes().await
    }

    async fn mark_access_code_used(&self, id: &AccessCodeId) -> Result<AccessCode, DomainError> {
        self.inner.mark_access_code_used(id).await
    }
}

#[async_trait]
impl DiscountCodeStore for FlakyStore {
    async fn create_discount_code(&self, code: &DiscountCode) -> Result<DiscountCode, DomainError> {
        self.inner.create_discount_code(code).await
    }

    async fn get_discount_code(&self, code: &str) -> Result<Option<DiscountCode>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get_discount_code(code).await
    }

    async fn list_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.list_discount_codes().await
    }

    async fn list_active_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.list_active_discount_codes().await
    }

    async fn update_discount_code(
        &self,
        code: &str,
        update: &DiscountCodeUpdate,
    ) -> Result<DiscountCode, DomainError> {
        self.inner.update_discount_code(code, update).await
    }

    async fn increment_discount_code_uses(&self, code: &str) -> Result<DiscountCode, DomainError> {
        Self::check(&self.fail_increment, "increment")?;
        self.inner.increment_discount_code_uses(code).await
    }
}
