//! Hosted backend data store.
//!
//! Maps each storage call onto a PostgREST request. Upserts use
//! `resolution=merge-duplicates`. The discount-use increment is a
//! compare-and-swap: PATCH filtered on the `current_uses` value just read,
//! retried a bounded number of times when another writer got there first.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::domain::codes::{
    normalize_code, AccessCode, DiscountCode, DiscountCodeUpdate, NewAccessCode,
};
use crate::domain::foundation::{
    AccessCodeId, DomainError, ErrorCode, MembershipId, Timestamp, UserId,
};
use crate::domain::membership::Membership;
use crate::domain::profile::Profile;
use crate::ports::{AccessCodeStore, DiscountCodeStore, MembershipStore, ProfileStore};

use super::HostedClient;

/// Attempts before an increment gives up under contention.
const MAX_INCREMENT_ATTEMPTS: usize = 5;

const RETURN_ROWS: &str = "return=representation";
const UPSERT_RETURN_ROWS: &str = "resolution=merge-duplicates,return=representation";

pub struct HostedStore {
    client: HostedClient,
}

impl HostedStore {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }

    fn eq(value: impl std::fmt::Display) -> String {
        format!("eq.{}", value)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, DomainError> {
        let request = self
            .client
            .request(Method::GET, &self.client.rest_url(table), None)
            .query(&[("select", "*")])
            .query(query);
        self.client.send_json(request).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, DomainError> {
        let mut query = query.to_vec();
        query.push(("limit", "1".to_string()));
        Ok(self.select(table, &query).await?.into_iter().next())
    }

    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        table: &str,
        query: &[(&str, String)],
        prefer: &str,
        body: &B,
    ) -> Result<Vec<T>, DomainError> {
        let request = self
            .client
            .request(method, &self.client.rest_url(table), None)
            .header("Prefer", prefer)
            .query(query)
            .json(body);
        self.client.send_json(request).await
    }

    fn first<T>(rows: Vec<T>, table: &str) -> Result<T, DomainError> {
        rows.into_iter().next().ok_or_else(|| {
            DomainError::database(format!("{} write returned no rows", table))
        })
    }
}

fn discount_not_found(code: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DiscountCodeNotFound,
        format!("Discount code not found: {}", code),
    )
}

#[async_trait]
impl ProfileStore for HostedStore {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        self.select_one("profiles", &[("user_id", Self::eq(user_id))])
            .await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, DomainError> {
        let rows = self
            .write(
                Method::POST,
                "profiles",
                &[("on_conflict", "user_id".to_string())],
                UPSERT_RETURN_ROWS,
                profile,
            )
            .await?;
        Self::first(rows, "profiles")
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, DomainError> {
        self.select("profiles", &[("order", "created_at.desc".to_string())])
            .await
    }
}

#[async_trait]
impl MembershipStore for HostedStore {
    async fn get_membership(&self, user_id: &UserId) -> Result<Option<Membership>, DomainError> {
        self.select_one(
            "memberships",
            &[
                ("user_id", Self::eq(user_id)),
                ("order", "updated_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn get_active_membership(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Membership>, DomainError> {
        self.select_one(
            "memberships",
            &[
                ("user_id", Self::eq(user_id)),
                ("status", Self::eq("active")),
                ("order", "updated_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn upsert_membership(&self, membership: &Membership) -> Result<Membership, DomainError> {
        let rows = self
            .write(
                Method::POST,
                "memberships",
                &[("on_conflict", "id".to_string())],
                UPSERT_RETURN_ROWS,
                membership,
            )
            .await?;
        Self::first(rows, "memberships")
    }

    async fn list_memberships(&self) -> Result<Vec<Membership>, DomainError> {
        self.select("memberships", &[("order", "created_at.desc".to_string())])
            .await
    }

    async fn list_active_memberships(&self) -> Result<Vec<Membership>, DomainError> {
        self.select(
            "memberships",
            &[
                ("status", Self::eq("active")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl AccessCodeStore for HostedStore {
    async fn create_access_code(&self, code: NewAccessCode) -> Result<AccessCode, DomainError> {
        let record = code.into_access_code();
        let rows = self
            .write(Method::POST, "access_codes", &[], RETURN_ROWS, &record)
            .await?;
        Self::first(rows, "access_codes")
    }

    async fn get_access_code(&self, code: &str) -> Result<Option<AccessCode>, DomainError> {
        self.select_one("access_codes", &[("code", Self::eq(normalize_code(code)))])
            .await
    }

    async fn get_access_code_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Option<AccessCode>, DomainError> {
        self.select_one(
            "access_codes",
            &[
                ("membership_id", Self::eq(membership_id)),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn list_access_codes_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AccessCode>, DomainError> {
        self.select(
            "access_codes",
            &[
                ("user_id", Self::eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn list_access_codes(&self) -> Result<Vec<AccessCode>, DomainError> {
        self.select("access_codes", &[("order", "created_at.desc".to_string())])
            .await
    }

    async fn mark_access_code_used(&self, id: &AccessCodeId) -> Result<AccessCode, DomainError> {
        let existing: AccessCode = self
            .select_one("access_codes", &[("id", Self::eq(id))])
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::AccessCodeNotFound,
                    format!("Access code not found: {}", id),
                )
            })?;

        let used_at = existing.used_at.unwrap_or_else(Timestamp::now);
        let rows = self
            .write(
                Method::PATCH,
                "access_codes",
                &[("id", Self::eq(id))],
                RETURN_ROWS,
                &json!({ "is_used": true, "used_at": used_at }),
            )
            .await?;
        Self::first(rows, "access_codes")
    }
}

#[async_trait]
impl DiscountCodeStore for HostedStore {
    async fn create_discount_code(&self, code: &DiscountCode) -> Result<DiscountCode, DomainError> {
        let mut record = code.clone();
        record.code = normalize_code(&record.code);
        let rows = self
            .write(Method::POST, "discount_codes", &[], RETURN_ROWS, &record)
            .await?;
        Self::first(rows, "discount_codes")
    }

    async fn get_discount_code(&self, code: &str) -> Result<Option<DiscountCode>, DomainError> {
        self.select_one("discount_codes", &[("code", Self::eq(normalize_code(code)))])
            .await
    }

    async fn list_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError> {
        self.select("discount_codes", &[("order", "created_at.desc".to_string())])
            .await
    }

    async fn list_active_discount_codes(&self) -> Result<Vec<DiscountCode>, DomainError> {
        self.select(
            "discount_codes",
            &[
                ("is_active", Self::eq("true")),
                ("expires_at", format!("gt.{}", Timestamp::now().to_rfc3339())),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn update_discount_code(
        &self,
        code: &str,
        update: &DiscountCodeUpdate,
    ) -> Result<DiscountCode, DomainError> {
        let normalized = normalize_code(code);
        let rows: Vec<DiscountCode> = self
            .write(
                Method::PATCH,
                "discount_codes",
                &[("code", Self::eq(&normalized))],
                RETURN_ROWS,
                update,
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| discount_not_found(&normalized))
    }

    async fn increment_discount_code_uses(&self, code: &str) -> Result<DiscountCode, DomainError> {
        let normalized = normalize_code(code);

        for attempt in 1..=MAX_INCREMENT_ATTEMPTS {
            let current: DiscountCode = self
                .get_discount_code(&normalized)
                .await?
                .ok_or_else(|| discount_not_found(&normalized))?;

            let rows: Vec<DiscountCode> = self
                .write(
                    Method::PATCH,
                    "discount_codes",
                    &[
                        ("code", Self::eq(&normalized)),
                        ("current_uses", Self::eq(current.current_uses)),
                    ],
                    RETURN_ROWS,
                    &json!({ "current_uses": current.current_uses + 1 }),
                )
                .await?;

            if let Some(updated) = rows.into_iter().next() {
                return Ok(updated);
            }
            tracing::debug!(code = %normalized, attempt, "Discount increment lost race, retrying");
        }

        tracing::warn!(code = %normalized, "Discount increment gave up under contention");
        Err(DomainError::new(
            ErrorCode::Conflict,
            format!(
                "Discount code {} is being redeemed concurrently; try again",
                normalized
            ),
        ))
    }
}
