//! GetMembersWithAccessCodesHandler - admin member listing.
//!
//! Joins active memberships with profiles and access codes. Read failures
//! are logged and produce an empty list.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::codes::AccessCode;
use crate::domain::foundation::{DomainError, MembershipId, Timestamp, UserId};
use crate::domain::membership::{MembershipStatus, PlanId};
use crate::ports::{AccessCodeStore, DataStore, MembershipStore, ProfileStore};

/// Shown when a membership has no used access code.
pub const NO_ACCESS_CODE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberWithAccessCode {
    pub membership_id: MembershipId,
    pub user_id: UserId,
    pub email: Option<String>,
    pub plan_id: PlanId,
    pub plan_name: String,
    pub status: MembershipStatus,
    pub start_date: Timestamp,
    pub next_billing_date: Timestamp,
    pub access_code: String,
}

pub struct GetMembersWithAccessCodesHandler {
    store: Arc<dyn DataStore>,
}

impl GetMembersWithAccessCodesHandler {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self) -> Vec<MemberWithAccessCode> {
        match self.load().await {
            Ok(members) => members,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load members with access codes");
                Vec::new()
            }
        }
    }

    async fn load(&self) -> Result<Vec<MemberWithAccessCode>, DomainError> {
        let memberships = self.store.list_active_memberships().await?;
        let codes = self.store.list_access_codes().await?;
        let profiles = self.store.list_profiles().await?;

        let emails: HashMap<&UserId, Option<&String>> = profiles
            .iter()
            .map(|p| (&p.user_id, p.email.as_ref()))
            .collect();

        // Earliest used code per membership.
        let mut first_used: HashMap<MembershipId, &AccessCode> = HashMap::new();
        for code in codes.iter().filter(|c| c.is_used) {
            first_used
                .entry(code.membership_id)
                .and_modify(|current| {
                    if code.created_at < current.created_at {
                        *current = code;
                    }
                })
                .or_insert(code);
        }

        Ok(memberships
            .into_iter()
            .map(|m| MemberWithAccessCode {
                email: emails.get(&m.user_id).copied().flatten().cloned(),
                access_code: first_used
                    .get(&m.id)
                    .map(|c| c.code.clone())
                    .unwrap_or_else(|| NO_ACCESS_CODE.to_string()),
                plan_name: m.plan_id.display_name().to_string(),
                membership_id: m.id,
                user_id: m.user_id,
                plan_id: m.plan_id,
                status: m.status,
                start_date: m.start_date,
                next_billing_date: m.next_billing_date,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryStore, SEED_MEMBER_ACCESS_CODE, SEED_MEMBER_ID, SEED_USER_ID};
    use crate::application::testing::FlakyStore;
    use crate::domain::membership::{Membership, PaymentStatus};

    #[tokio::test]
    async fn lists_seeded_member_with_code_and_email() {
        let handler = GetMembersWithAccessCodesHandler::new(Arc::new(InMemoryStore::seeded().unwrap()));

        let members = handler.handle().await;

        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id.as_str(), SEED_MEMBER_ID);
        assert_eq!(members[0].access_code, SEED_MEMBER_ACCESS_CODE);
        assert_eq!(members[0].email.as_deref(), Some("member@example.com"));
    }

    #[tokio::test]
    async fn membership_without_code_shows_sentinel() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        store
            .upsert_membership(&Membership::start(
                MembershipId::new(),
                UserId::new(SEED_USER_ID).unwrap(),
                PlanId::MaintenanceBasic,
                PaymentStatus::Paid,
                None,
            ))
            .await
            .unwrap();
        let handler = GetMembersWithAccessCodesHandler::new(store);

        let members = handler.handle().await;
        let plain = members
            .iter()
            .find(|m| m.user_id.as_str() == SEED_USER_ID)
            .unwrap();
        assert_eq!(plain.access_code, NO_ACCESS_CODE);
    }

    #[tokio::test]
    async fn storage_failure_yields_empty_list() {
        let store = Arc::new(FlakyStore::seeded());
        store.fail_reads();
        let handler = GetMembersWithAccessCodesHandler::new(store);

        assert!(handler.handle().await.is_empty());
    }
}
