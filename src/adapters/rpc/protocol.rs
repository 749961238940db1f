//! Wire format of the relational RPC endpoint.
//!
//! Requests are `{"action": "...", "payload": {...}}`; responses are either
//! `{"data": ...}` or `{"error": "..."}`. Each action maps onto one storage
//! operation. Action names are `collection_operation` with the operation in
//! camel case, e.g. `accessCodes_getByMembership`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::codes::{DiscountCode, DiscountCodeUpdate, NewAccessCode};
use crate::domain::foundation::{AccessCodeId, MembershipId, UserId};
use crate::domain::membership::Membership;
use crate::domain::profile::Profile;

/// Shared secret between the RPC client and the server that owns the database.
pub const RPC_SECRET_HEADER: &str = "X-Rpc-Secret";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum RpcRequest {
    #[serde(rename = "profiles_get")]
    ProfilesGet { user_id: UserId },
    #[serde(rename = "profiles_upsert")]
    ProfilesUpsert { profile: Profile },
    #[serde(rename = "profiles_list")]
    ProfilesList,

    #[serde(rename = "memberships_get")]
    MembershipsGet { user_id: UserId },
    #[serde(rename = "memberships_getActive")]
    MembershipsGetActive { user_id: UserId },
    #[serde(rename = "memberships_upsert")]
    MembershipsUpsert { membership: Membership },
    #[serde(rename = "memberships_list")]
    MembershipsList,
    #[serde(rename = "memberships_listActive")]
    MembershipsListActive,

    #[serde(rename = "accessCodes_create")]
    AccessCodesCreate { access_code: NewAccessCode },
    #[serde(rename = "accessCodes_get")]
    AccessCodesGet { code: String },
    #[serde(rename = "accessCodes_getByMembership")]
    AccessCodesGetByMembership { membership_id: MembershipId },
    #[serde(rename = "accessCodes_listByUser")]
    AccessCodesListByUser { user_id: UserId },
    #[serde(rename = "accessCodes_list")]
    AccessCodesList,
    #[serde(rename = "accessCodes_markUsed")]
    AccessCodesMarkUsed { id: AccessCodeId },

    #[serde(rename = "discountCodes_create")]
    DiscountCodesCreate { discount_code: DiscountCode },
    #[serde(rename = "discountCodes_get")]
    DiscountCodesGet { code: String },
    #[serde(rename = "discountCodes_list")]
    DiscountCodesList,
    #[serde(rename = "discountCodes_listActive")]
    DiscountCodesListActive,
    #[serde(rename = "discountCodes_update")]
    DiscountCodesUpdate { code: String, update: DiscountCodeUpdate },
    #[serde(rename = "discountCodes_incrementUses")]
    DiscountCodesIncrementUses { code: String },
}

impl RpcRequest {
    /// Action name as it appears on the wire, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            RpcRequest::ProfilesGet { .. } => "profiles_get",
            RpcRequest::ProfilesUpsert { .. } => "profiles_upsert",
            RpcRequest::ProfilesList => "profiles_list",
            RpcRequest::MembershipsGet { .. } => "memberships_get",
            RpcRequest::MembershipsGetActive { .. } => "memberships_getActive",
            RpcRequest::MembershipsUpsert { .. } => "memberships_upsert",
            RpcRequest::MembershipsList => "memberships_list",
            RpcRequest::MembershipsListActive => "memberships_listActive",
            RpcRequest::AccessCodesCreate { .. } => "accessCodes_create",
            RpcRequest::AccessCodesGet { .. } => "accessCodes_get",
            RpcRequest::AccessCodesGetByMembership { .. } => "accessCodes_getByMembership",
            RpcRequest::AccessCodesListByUser { .. } => "accessCodes_listByUser",
            RpcRequest::AccessCodesList => "accessCodes_list",
            RpcRequest::AccessCodesMarkUsed { .. } => "accessCodes_markUsed",
            RpcRequest::DiscountCodesCreate { .. } => "discountCodes_create",
            RpcRequest::DiscountCodesGet { .. } => "discountCodes_get",
            RpcRequest::DiscountCodesList => "discountCodes_list",
            RpcRequest::DiscountCodesListActive => "discountCodes_listActive",
            RpcRequest::DiscountCodesUpdate { .. } => "discountCodes_update",
            RpcRequest::DiscountCodesIncrementUses { .. } => "discountCodes_incrementUses",
        }
    }
}

/// Response envelope. Exactly one of the fields is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RpcResponse {
    pub fn data(value: Value) -> Self {
        Self {
            data: Some(value),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }
}
