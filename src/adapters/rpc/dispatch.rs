//! Server side of the relational RPC endpoint: routes one request to the
//! matching storage operation.

use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{AccessCodeStore, DataStore, DiscountCodeStore, MembershipStore, ProfileStore};

use super::RpcRequest;

fn to_data<T: Serialize>(value: T) -> Result<Value, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::new(ErrorCode::SerializationError, e.to_string()))
}

/// Executes `request` against `store` and returns the `data` payload.
pub async fn dispatch(store: &dyn DataStore, request: RpcRequest) -> Result<Value, DomainError> {
    match request {
        RpcRequest::ProfilesGet { user_id } => to_data(store.get_profile(&user_id).await?),
        RpcRequest::ProfilesUpsert { profile } => to_data(store.upsert_profile(&profile).await?),
        RpcRequest::ProfilesList => to_data(store.list_profiles().await?),

        RpcRequest::MembershipsGet { user_id } => to_data(store.get_membership(&user_id).await?),
        RpcRequest::MembershipsGetActive { user_id } => {
            to_data(store.get_active_membership(&user_id).await?)
        }
        RpcRequest::MembershipsUpsert { membership } => {
            to_data(store.upsert_membership(&membership).await?)
        }
        RpcRequest::MembershipsList => to_data(store.list_memberships().await?),
        RpcRequest::MembershipsListActive => to_data(store.list_active_memberships().await?),

        RpcRequest::AccessCodesCreate { access_code } => {
            to_data(store.create_access_code(access_code).await?)
        }
        RpcRequest::AccessCodesGet { code } => to_data(store.get_access_code(&code).await?),
        RpcRequest::AccessCodesGetByMembership { membership_id } => {
            to_data(store.get_access_code_by_membership(&membership_id).await?)
        }
        RpcRequest::AccessCodesListByUser { user_id } => {
            to_data(store.list_access_codes_by_user(&user_id).await?)
        }
        RpcRequest::AccessCodesList => to_data(store.list_access_codes().await?),
        RpcRequest::AccessCodesMarkUsed { id } => to_data(store.mark_access_code_used(&id).await?),

        RpcRequest::DiscountCodesCreate { discount_code } => {
            to_data(store.create_discount_code(&discount_code).await?)
        }
        RpcRequest::DiscountCodesGet { code } => to_data(store.get_discount_code(&code).await?),
        RpcRequest::DiscountCodesList => to_data(store.list_discount_codes().await?),
        RpcRequest::DiscountCodesListActive => to_data(store.list_active_discount_codes().await?),
        RpcRequest::DiscountCodesUpdate { code, update } => {
            to_data(store.update_discount_code(&code, &update).await?)
        }
        RpcRequest::DiscountCodesIncrementUses { code } => {
            to_data(store.increment_discount_code_uses(&code).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryStore, SEED_MEMBER_ID};
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn dispatches_lookup_to_store() {
        let store = InMemoryStore::seeded().unwrap();
        let data = dispatch(
            &store,
            RpcRequest::MembershipsGetActive {
                user_id: UserId::new(SEED_MEMBER_ID).unwrap(),
            },
        )
        .await
        .unwrap();
        assert_eq!(data["status"], "active");
        assert_eq!(data["plan_id"], "maintenance-premium");
    }

    #[tokio::test]
    async fn missing_row_is_null_data() {
        let store = InMemoryStore::new();
        let data = dispatch(
            &store,
            RpcRequest::DiscountCodesGet {
                code: "NOPE".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(data.is_null());
    }

    #[tokio::test]
    async fn increment_returns_updated_row() {
        let store = InMemoryStore::seeded().unwrap();
        let data = dispatch(
            &store,
            RpcRequest::DiscountCodesIncrementUses {
                code: "WELCOME10".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(data["current_uses"], 1);
    }
}
