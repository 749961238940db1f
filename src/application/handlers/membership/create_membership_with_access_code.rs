//! CreateMembershipWithAccessCodeHandler - runs after a successful payment.
//!
//! Steps:
//! 1. Persist an active membership (binding the signup code, if any).
//! 2. Mint and persist the member's access code. If this fails the
//!    membership from step 1 is closed again before the error is returned.
//! 3. Send the confirmation. Delivery failures only clear `email_sent`.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::codes::{
    calculate_access_code_expiration, generate_access_code, normalize_code, AccessCode,
    NewAccessCode, DEFAULT_ACCESS_CODE_LENGTH, DEFAULT_ACCESS_CODE_PREFIX,
    DEFAULT_ACCESS_CODE_VALIDITY_DAYS,
};
use crate::domain::foundation::{ErrorCode, MembershipId, UserId};
use crate::domain::membership::{
    Membership, MembershipConfirmation, MembershipError, PaymentStatus, PlanId,
};
use crate::domain::profile::Profile;
use crate::ports::{AccessCodeStore, DataStore, MembershipNotifier, MembershipStore, ProfileStore};

/// Fresh codes tried when a minted code collides with an existing one.
const MINT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct CreateMembershipCommand {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub plan_id: PlanId,
    pub plan_name: String,
    /// Charged monthly price after discount, as quoted in the confirmation.
    pub monthly_price_cents: i64,
    pub payment_status: PaymentStatus,
    /// Access code entered at signup, consumed by this membership.
    pub signup_access_code: Option<String>,
}

impl CreateMembershipCommand {
    /// A paid signup at the plan's list price.
    pub fn paid(user_id: UserId, email: impl Into<String>, name: impl Into<String>, plan_id: PlanId) -> Self {
        Self {
            user_id,
            email: email.into(),
            name: name.into(),
            plan_id,
            plan_name: plan_id.display_name().to_string(),
            monthly_price_cents: plan_id.monthly_price_cents(),
            payment_status: PaymentStatus::Paid,
            signup_access_code: None,
        }
    }

    pub fn at_price(self, monthly_price_cents: i64) -> Self {
        Self {
            monthly_price_cents,
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMembershipResult {
    pub success: bool,
    pub membership: Membership,
    pub access_code: AccessCode,
    pub email_sent: bool,
}

pub struct CreateMembershipWithAccessCodeHandler {
    store: Arc<dyn DataStore>,
    notifier: Arc<dyn MembershipNotifier>,
}

impl CreateMembershipWithAccessCodeHandler {
    pub fn new(store: Arc<dyn DataStore>, notifier: Arc<dyn MembershipNotifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn handle(
        &self,
        cmd: CreateMembershipCommand,
    ) -> Result<CreateMembershipResult, MembershipError> {
        self.ensure_profile(&cmd).await?;

        let signup_code = cmd
            .signup_access_code
            .as_deref()
            .map(normalize_code)
            .filter(|c| !c.is_empty());

        // 1. Membership
        let membership = Membership::start(
            MembershipId::new(),
            cmd.user_id.clone(),
            cmd.plan_id,
            cmd.payment_status,
            signup_code.clone(),
        );
        let membership = self.store.upsert_membership(&membership).await?;
        tracing::info!(
            user_id = %cmd.user_id,
            membership_id = %membership.id,
            plan_id = %cmd.plan_id,
            "Membership created"
        );

        if let Some(code) = &signup_code {
            self.bind_signup_code(code).await;
        }

        // 2. Access code
        let access_code = match self.mint_access_code(&membership).await {
            Ok(code) => code,
            Err(err) => {
                self.compensate(membership).await;
                return Err(err);
            }
        };

        // 3. Confirmation
        let confirmation = MembershipConfirmation {
            email: cmd.email.clone(),
            name: cmd.name.clone(),
            plan_id: cmd.plan_id,
            plan_name: cmd.plan_name.clone(),
            access_code: access_code.code.clone(),
            monthly_price_cents: cmd.monthly_price_cents,
            start_date: membership.start_date,
        };
        let email_sent = match self.notifier.send_confirmation(&confirmation).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    membership_id = %membership.id,
                    error = %e,
                    "Membership created but confirmation was not delivered"
                );
                false
            }
        };

        Ok(CreateMembershipResult {
            success: true,
            membership,
            access_code,
            email_sent,
        })
    }

    /// Memberships reference a profile; create a minimal one on first purchase.
    async fn ensure_profile(&self, cmd: &CreateMembershipCommand) -> Result<(), MembershipError> {
        if self.store.get_profile(&cmd.user_id).await?.is_some() {
            return Ok(());
        }
        let email = Some(cmd.email.trim().to_string()).filter(|e| !e.is_empty());
        self.store
            .upsert_profile(&Profile::new(cmd.user_id.clone(), email))
            .await?;
        tracing::debug!(user_id = %cmd.user_id, "Profile created for new member");
        Ok(())
    }

    /// Marks an existing, unbound signup code as used. A missing code is
    /// logged and otherwise ignored.
    async fn bind_signup_code(&self, code: &str) {
        match self.store.get_access_code(code).await {
            Ok(Some(existing)) if !existing.is_used => {
                if let Err(e) = self.store.mark_access_code_used(&existing.id).await {
                    tracing::warn!(code, error = %e, "Failed to bind signup access code");
                }
            }
            Ok(Some(_)) => {}
            Ok(None) => tracing::warn!(code, "Signup access code not found"),
            Err(e) => tracing::warn!(code, error = %e, "Signup access code lookup failed"),
        }
    }

    async fn mint_access_code(&self, membership: &Membership) -> Result<AccessCode, MembershipError> {
        let expires_at = calculate_access_code_expiration(DEFAULT_ACCESS_CODE_VALIDITY_DAYS);
        let mut last_error = None;

        for _ in 0..MINT_ATTEMPTS {
            let code = generate_access_code(DEFAULT_ACCESS_CODE_PREFIX, DEFAULT_ACCESS_CODE_LENGTH);
            let new_code = NewAccessCode::bound(
                code,
                membership.user_id.clone(),
                membership.id,
                membership.plan_id,
                expires_at,
            );
            match self.store.create_access_code(new_code).await {
                Ok(created) => {
                    tracing::info!(
                        membership_id = %membership.id,
                        code = %created.code,
                        "Access code minted"
                    );
                    return Ok(created);
                }
                Err(e) if e.code == ErrorCode::Conflict => {
                    tracing::debug!(membership_id = %membership.id, "Access code collision, regenerating");
                    last_error = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error
            .map(MembershipError::from)
            .unwrap_or_else(|| MembershipError::infrastructure("Access code could not be minted")))
    }

    /// Closes a membership whose access code could not be created.
    async fn compensate(&self, mut membership: Membership) {
        if let Err(e) = membership.cancel() {
            tracing::error!(membership_id = %membership.id, error = %e, "Compensation could not cancel membership");
            return;
        }
        match self.store.upsert_membership(&membership).await {
            Ok(_) => tracing::warn!(
                membership_id = %membership.id,
                "Membership closed after access code failure"
            ),
            Err(e) => tracing::error!(
                membership_id = %membership.id,
                error = %e,
                "Compensation failed; membership left active without access code"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::email::LoggingNotifier;
    use crate::adapters::memory::{InMemoryStore, SEED_USER_ID};
    use crate::application::testing::{FlakyStore, RecordingNotifier};
    use crate::domain::codes::is_valid_access_code_format;
    use crate::domain::membership::MembershipStatus;
    use crate::ports::NotificationError;
    use async_trait::async_trait;

    struct DownNotifier;

    #[async_trait]
    impl MembershipNotifier for DownNotifier {
        async fn send_confirmation(
            &self,
            _confirmation: &MembershipConfirmation,
        ) -> Result<(), NotificationError> {
            Err(NotificationError::Transport("connection refused".into()))
        }
    }

    fn command(user: &str) -> CreateMembershipCommand {
        CreateMembershipCommand::paid(
            UserId::new(user).unwrap(),
            "new@example.com",
            "New Member",
            PlanId::MaintenancePremium,
        )
    }

    #[tokio::test]
    async fn creates_membership_code_and_sends_confirmation() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let handler = CreateMembershipWithAccessCodeHandler::new(store.clone(), Arc::new(LoggingNotifier));

        let result = handler.handle(command(SEED_USER_ID)).await.unwrap();

        assert!(result.success);
        assert!(result.email_sent);
        assert_eq!(result.membership.status, MembershipStatus::Active);
        assert_eq!(result.membership.payment_status, PaymentStatus::Paid);
        assert!(result.access_code.code.starts_with("MEM-"));
        assert!(is_valid_access_code_format(&result.access_code.code));
        assert!(result.access_code.is_used);
        assert_eq!(result.access_code.membership_id, result.membership.id);

        let stored = store
            .get_access_code_by_membership(&result.membership.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.code, result.access_code.code);
    }

    #[tokio::test]
    async fn billing_is_thirty_days_and_code_lasts_a_year() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let handler = CreateMembershipWithAccessCodeHandler::new(store, Arc::new(LoggingNotifier));

        let result = handler.handle(command(SEED_USER_ID)).await.unwrap();

        let billing = result
            .membership
            .next_billing_date
            .duration_since(&result.membership.start_date);
        assert_eq!(billing.num_days(), 30);
        assert!((364..=365).contains(&result.access_code.remaining_days()));
    }

    #[tokio::test]
    async fn unknown_user_gets_a_profile() {
        let store = Arc::new(InMemoryStore::new());
        let handler = CreateMembershipWithAccessCodeHandler::new(store.clone(), Arc::new(LoggingNotifier));

        handler.handle(command("brand-new")).await.unwrap();

        let profile = store
            .get_profile(&UserId::new("brand-new").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.email.as_deref(), Some("new@example.com"));
    }

    #[tokio::test]
    async fn signup_code_is_recorded_and_bound() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let unbound = store
            .create_access_code(NewAccessCode {
                is_used: false,
                used_at: None,
                ..NewAccessCode::bound(
                    "MEM-GIFT0001",
                    UserId::new(SEED_USER_ID).unwrap(),
                    MembershipId::new(),
                    PlanId::MaintenanceBasic,
                    calculate_access_code_expiration(30),
                )
            })
            .await
            .unwrap();
        assert!(!unbound.is_used);

        let handler = CreateMembershipWithAccessCodeHandler::new(store.clone(), Arc::new(LoggingNotifier));
        let mut cmd = command(SEED_USER_ID);
        cmd.signup_access_code = Some("mem-gift0001".to_string());
        let result = handler.handle(cmd).await.unwrap();

        assert_eq!(result.membership.access_code.as_deref(), Some("MEM-GIFT0001"));
        let bound = store.get_access_code("MEM-GIFT0001").await.unwrap().unwrap();
        assert!(bound.is_used);
        assert!(bound.used_at.is_some());
    }

    #[tokio::test]
    async fn missing_signup_code_does_not_block_signup() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let handler = CreateMembershipWithAccessCodeHandler::new(store, Arc::new(LoggingNotifier));
        let mut cmd = command(SEED_USER_ID);
        cmd.signup_access_code = Some("MEM-NOPE0000".to_string());

        assert!(handler.handle(cmd).await.is_ok());
    }

    #[tokio::test]
    async fn confirmation_quotes_the_charged_price() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = CreateMembershipWithAccessCodeHandler::new(store, notifier.clone());

        handler
            .handle(command(SEED_USER_ID).at_price(19_999))
            .await
            .unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].monthly_price_cents, 19_999);
        assert_eq!(sent[0].plan_name, "Premium Maintenance");
        assert!(sent[0].text_body().contains("$199.99"));
    }

    #[tokio::test]
    async fn notification_failure_only_clears_email_sent() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let handler = CreateMembershipWithAccessCodeHandler::new(store, Arc::new(DownNotifier));

        let result = handler.handle(command(SEED_USER_ID)).await.unwrap();
        assert!(result.success);
        assert!(!result.email_sent);
    }

    #[tokio::test]
    async fn access_code_failure_closes_the_membership() {
        let store = Arc::new(FlakyStore::seeded());
        store.fail_access_code_create();
        let handler = CreateMembershipWithAccessCodeHandler::new(store.clone(), Arc::new(LoggingNotifier));
        let user = UserId::new(SEED_USER_ID).unwrap();

        let err = handler.handle(command(SEED_USER_ID)).await.unwrap_err();
        assert!(matches!(err, MembershipError::Infrastructure(_)));

        assert!(store.get_active_membership(&user).await.unwrap().is_none());
        let closed = store.get_membership(&user).await.unwrap().unwrap();
        assert_eq!(closed.status, MembershipStatus::Canceled);
        assert!(closed.end_date.is_some());
    }
}
