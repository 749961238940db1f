//! CancelMembershipHandler - administrative cancel.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::membership::{Membership, MembershipError};
use crate::ports::{DataStore, MembershipStore};

use super::require_admin;

#[derive(Debug, Clone)]
pub struct CancelMembershipCommand {
    /// Caller; must hold the admin role.
    pub admin_id: UserId,
    /// Member whose active membership is closed.
    pub user_id: UserId,
}

pub struct CancelMembershipHandler {
    store: Arc<dyn DataStore>,
}

impl CancelMembershipHandler {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, cmd: CancelMembershipCommand) -> Result<Membership, MembershipError> {
        require_admin(self.store.as_ref(), &cmd.admin_id).await?;

        let mut membership = self
            .store
            .get_active_membership(&cmd.user_id)
            .await?
            .ok_or_else(|| MembershipError::not_found_for_user(cmd.user_id.clone()))?;

        membership.cancel()?;
        let membership = self.store.upsert_membership(&membership).await?;

        tracing::info!(
            admin_id = %cmd.admin_id,
            user_id = %cmd.user_id,
            membership_id = %membership.id,
            "Membership canceled"
        );
        Ok(membership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryStore, SEED_ADMIN_ID, SEED_MEMBER_ID, SEED_USER_ID};
    use crate::domain::membership::MembershipStatus;

    fn cmd(admin: &str, user: &str) -> CancelMembershipCommand {
        CancelMembershipCommand {
            admin_id: UserId::new(admin).unwrap(),
            user_id: UserId::new(user).unwrap(),
        }
    }

    #[tokio::test]
    async fn admin_cancels_active_membership() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let handler = CancelMembershipHandler::new(store.clone());

        let canceled = handler.handle(cmd(SEED_ADMIN_ID, SEED_MEMBER_ID)).await.unwrap();

        assert_eq!(canceled.status, MembershipStatus::Canceled);
        assert!(canceled.end_date.is_some());
        let member = UserId::new(SEED_MEMBER_ID).unwrap();
        assert!(store.get_active_membership(&member).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let handler = CancelMembershipHandler::new(Arc::new(InMemoryStore::seeded().unwrap()));

        let err = handler.handle(cmd(SEED_USER_ID, SEED_MEMBER_ID)).await.unwrap_err();
        assert_eq!(err, MembershipError::Forbidden);
    }

    #[tokio::test]
    async fn user_without_membership_is_not_found() {
        let handler = CancelMembershipHandler::new(Arc::new(InMemoryStore::seeded().unwrap()));

        let err = handler.handle(cmd(SEED_ADMIN_ID, SEED_USER_ID)).await.unwrap_err();
        assert!(matches!(err, MembershipError::NotFoundForUser(_)));
    }

    #[tokio::test]
    async fn second_cancel_finds_nothing_active() {
        let handler = CancelMembershipHandler::new(Arc::new(InMemoryStore::seeded().unwrap()));
        handler.handle(cmd(SEED_ADMIN_ID, SEED_MEMBER_ID)).await.unwrap();

        let err = handler.handle(cmd(SEED_ADMIN_ID, SEED_MEMBER_ID)).await.unwrap_err();
        assert!(matches!(err, MembershipError::NotFoundForUser(_)));
    }
}
