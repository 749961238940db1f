//! Relational RPC client store.
//!
//! Forwards every storage call to the `/api/db` endpoint of a server that
//! owns the relational database. Atomicity of the discount increment is the
//! server's: one request, one SQL `UPDATE`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::codes::{AccessCode, DiscountCode, DiscountCodeUpdate, NewAccessCode};
use crate::domain::foundation::{AccessCodeId, DomainError, ErrorCode, MembershipId, UserId};
use crate::domain::membership::Membership;
use crate::domain::profile::Profile;
use crate::ports::{AccessCodeStore, DiscountCodeStore, MembershipStore, ProfileStore};

use super::{RpcRequest, RpcResponse, RPC_SECRET_HEADER};

pub struct RpcStore {
    endpoint: String,
    secret: SecretString,
    http_client: reqwest::Client,
}

impl RpcStore {
    /// `endpoint` is the full URL of the RPC route, e.g. `http://db-host/api/db`.
    pub fn new(endpoint: impl Into<String>, secret: SecretString) -> Self {
        Self {
            endpoint: endpoint.into(),
            secret,
            http_client: reqwest::Client::new(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, request: RpcRequest) -> Result<T, DomainError> {
        let action = request.action();
        tracing::debug!(action, endpoint = %self.endpoint, "RPC call");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(RPC_SECRET_HEADER, self.secret.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(action, error = %e, "RPC transport failure");
                DomainError::external(e.to_string())
            })?;

        let status = response.status();
        let envelope: RpcResponse = response.json().await.map_err(|e| {
            DomainError::external(format!("RPC response from {} unreadable: {}", status, e))
        })?;

        if let Some(message) = envelope.error {
            tracing::warn!(action, error = %message, "RPC call returned error");
            return Err(DomainError::database(message).with_detail("action", action));
        }

        serde_json::from_value(envelope.data.unwrap_or(serde_json::Value::Null))
            .map_err(|e| DomainError::new(ErrorCode::SerializationError, e.to_string()))
    }
}

#[async_trait]
impl ProfileStore for RpcStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        self.call(RpcRequest::ProfilesGet {
            user_id: user_id.clone(),
        })
        .await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, DomainError> {
        self.call(RpcRequest::ProfilesUpsert {
            profile: profile.clone(),
        })
        .await
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, DomainError> {
        self.call(RpcRequest::ProfilesList).await
    }
}

#[async_trait]
impl MembershipStore for RpcStore {
    async fn get_membership(&self, user_id: &UserId) -> Result<Option<Membership>, DomainError> {
        self.call(RpcRequest::MembershipsGet {
            user_id: user_id.clone(),
        })
        .await
    }

    async fn get_active_membership(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Membership>, DomainError> {
        self.call(RpcRequest::MembershipsGetActive {
            user_id: user_id.clone(),
        })
        .await
    }

    async fn upsert_membership(&self, membership: &Membership) -> Result<Membership, DomainError> {
        self.call(RpcRequest::MembershipsUpsert {
            membership: membership.clone(),
        })
        .await
    }

    async fn list_memberships(&self) -> Result<Vec<Membership>, DomainError> {
        self.call(RpcRequest::MembershipsList).await
    }

    async fn list_active_memberships(&self) -> Result<Vec<Membership>, DomainError> {
        self.call(RpcRequest::MembershipsListActive).await
    }
}

#[async_trait]
impl AccessCodeStore for RpcStore {
    async fn create_access_code(&self, code: NewAccessCode) -> Result<AccessCode, DomainError> {
        self.call(RpcRequest::AccessCodesCreate { access_code: code })
            .await
    }

    async fn get_access_code(&self, code: &str) -> Result<Option<AccessCode>, DomainError> {
        self.call(RpcRequest::AccessCodesGet {
            code: code.to_string(),
        })
        .await
    }

    async fn get_access_code_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Option<AccessCode>, DomainError> {
        self.call(RpcRequest::AccessCodesGetByMembership {
            membership_id: *membership_id,
        })
        .await
    }

    async fn list_access_codes_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AccessCode>, DomainError> {
        self.call(RpcRequest::AccessCodesListByUser {
            user_id: user_id.clone(),
        })
        .await
    }

    async fn list_access_codes(&self) -> Result<Vec<AccessCode>, DomainError> {
        self.call(RpcRequest::AccessCodesList).await
    }

    async fn mark_access_code_used(&self, id: &AccessCodeId) -> Result<AccessCode, DomainError> {
        self.call(RpcRequest::AccessCodesMarkUsed { id: *id }).await
    }
}

#[async_trait]
impl DiscountCodeStore for RpcStore {
    async fn create_discount_code(&self, code: &DiscountCode) -> Result<DiscountCode, DomainError> {
        self.call(RpcRequest::DiscountCodesCreate {
            discount_code: code.clone(),
        })
        .await
    }

    async fn get_discount_code(&self, code: &str) -> Result<Option<DiscountCode>, DomainError> {
        self.call(RpcRequest::DiscountCodesGet {
            code: code.to_string(),
        })
        .await
    }

    async fn list_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError> {
        self.call(RpcRequest::DiscountCodesList).await
    }

    async fn list_active_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError> {
        self.call(RpcRequest::DiscountCodesListActive).await
    }

    async fn update_discount_code(
        &self,
        code: &str,
        update: &DiscountCodeUpdate,
    ) -> Result<DiscountCode, DomainError> {
        self.call(RpcRequest::DiscountCodesUpdate {
            code: code.to_string(),
            update: update.clone(),
        })
        .await
    }

    async fn increment_discount_code_uses(&self, code: &str) -> Result<DiscountCode, DomainError> {
        self.call(RpcRequest::DiscountCodesIncrementUses {
            code: code.to_string(),
        })
        .await
    }
}
