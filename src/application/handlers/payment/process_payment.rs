//! ProcessPaymentHandler - on-site card payment for the first month.
//!
//! The price is computed here from the plan table and a server-validated
//! discount code. A succeeded charge creates the membership and counts the
//! discount use; a charge needing customer action returns the client
//! secret and creates nothing yet (the checkout webhook finishes the job).

use std::sync::Arc;

use serde::Serialize;

use crate::application::handlers::discount::{ValidateAndGetDiscountHandler, ValidateDiscountQuery};
use crate::application::handlers::membership::{
    CreateMembershipCommand, CreateMembershipResult, CreateMembershipWithAccessCodeHandler,
};
use crate::domain::foundation::UserId;
use crate::domain::membership::{MembershipError, PaymentStatus, PlanId};
use crate::domain::pricing::{summary_with_percentage, CheckoutSummary};
use crate::ports::{
    CustomerMetadata, DataStore, DiscountCodeStore, MembershipNotifier, PaymentIntentRequest,
    PaymentIntentStatus, PaymentProvider,
};

use super::payment_error_to_membership;

const CURRENCY: &str = "usd";

#[derive(Debug, Clone)]
pub struct ProcessPaymentCommand {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub plan_id: PlanId,
    /// Provider payment method token.
    pub payment_method: String,
    pub discount_code: Option<String>,
    pub signup_access_code: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessPaymentResult {
    /// `None` when nothing was charged.
    pub payment_intent_id: Option<String>,
    pub status: PaymentIntentStatus,
    pub client_secret: Option<String>,
    pub summary: CheckoutSummary,
    /// Present once the charge succeeded.
    pub membership: Option<CreateMembershipResult>,
}

pub struct ProcessPaymentHandler {
    store: Arc<dyn DataStore>,
    provider: Arc<dyn PaymentProvider>,
    discounts: ValidateAndGetDiscountHandler,
    create_membership: CreateMembershipWithAccessCodeHandler,
}

impl ProcessPaymentHandler {
    pub fn new(
        store: Arc<dyn DataStore>,
        provider: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn MembershipNotifier>,
    ) -> Self {
        Self {
            discounts: ValidateAndGetDiscountHandler::new(store.clone()),
            create_membership: CreateMembershipWithAccessCodeHandler::new(store.clone(), notifier),
            store,
            provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessPaymentCommand,
    ) -> Result<ProcessPaymentResult, MembershipError> {
        if cmd.payment_method.trim().is_empty() {
            return Err(MembershipError::validation("payment_method", "Payment method is required"));
        }
        if cmd.email.trim().is_empty() {
            return Err(MembershipError::validation("email", "Email is required"));
        }

        let summary = price(&self.discounts, cmd.plan_id, cmd.discount_code.as_deref()).await?;

        let (payment_intent_id, status, client_secret) = if summary.final_price == 0 {
            tracing::info!(user_id = %cmd.user_id, "Fully discounted; no charge");
            (None, PaymentIntentStatus::Succeeded, None)
        } else {
            let intent = self
                .provider
                .create_payment_intent(PaymentIntentRequest {
                    amount_cents: summary.final_price,
                    currency: CURRENCY.to_string(),
                    payment_method: cmd.payment_method.clone(),
                    customer: CustomerMetadata {
                        user_id: cmd.user_id.clone(),
                        email: cmd.email.clone(),
                        name: cmd.name.clone(),
                        plan_id: cmd.plan_id,
                        discount_code: summary.discount_code.clone(),
                    },
                    idempotency_key: cmd.idempotency_key.clone(),
                })
                .await
                .map_err(|e| {
                    tracing::warn!(user_id = %cmd.user_id, error = %e, "Payment intent failed");
                    payment_error_to_membership(e)
                })?;
            (Some(intent.id), intent.status, intent.client_secret)
        };

        match status {
            PaymentIntentStatus::Succeeded => {}
            PaymentIntentStatus::RequiresAction => {
                tracing::info!(user_id = %cmd.user_id, payment_intent_id = ?payment_intent_id, "Payment requires customer action");
                return Ok(ProcessPaymentResult {
                    payment_intent_id,
                    status,
                    client_secret,
                    summary,
                    membership: None,
                });
            }
            PaymentIntentStatus::Failed => {
                return Err(MembershipError::payment_failed("Payment was not completed"));
            }
        }

        let membership = self
            .create_membership
            .handle(CreateMembershipCommand {
                user_id: cmd.user_id.clone(),
                email: cmd.email,
                name: cmd.name,
                plan_id: cmd.plan_id,
                plan_name: summary.plan_name.clone(),
                monthly_price_cents: summary.final_price,
                payment_status: PaymentStatus::Paid,
                signup_access_code: cmd.signup_access_code,
            })
            .await?;

        if let Some(code) = &summary.discount_code {
            if let Err(e) = self.store.increment_discount_code_uses(code).await {
                tracing::warn!(code = %code, error = %e, "Discount use not counted");
            }
        }

        Ok(ProcessPaymentResult {
            payment_intent_id,
            status,
            client_secret,
            summary,
            membership: Some(membership),
        })
    }
}

/// Checkout price for `plan` with an optional stored discount code.
///
/// A code that fails validation is an error rather than silently ignored.
pub(super) async fn price(
    discounts: &ValidateAndGetDiscountHandler,
    plan: PlanId,
    discount_code: Option<&str>,
) -> Result<CheckoutSummary, MembershipError> {
    let code = discount_code.map(str::trim).filter(|c| !c.is_empty());
    let Some(code) = code else {
        return Ok(summary_with_percentage(plan, 0, None));
    };

    let discount = discounts
        .handle(ValidateDiscountQuery {
            code: code.to_string(),
            plan_id: plan,
        })
        .await?
        .into_result(code)?;

    Ok(summary_with_percentage(
        plan,
        discount.discount_percentage,
        Some(discount.code),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::email::LoggingNotifier;
    use crate::adapters::memory::{InMemoryStore, SEED_USER_ID};
    use crate::adapters::stripe::{
        MockCall, MockPaymentProvider, ACTION_REQUIRED_PAYMENT_METHOD, DECLINED_PAYMENT_METHOD,
    };
    use crate::application::testing::{FlakyStore, RecordingNotifier};
    use crate::domain::codes::{DiscountCode, PlanScope};
    use crate::domain::foundation::Timestamp;
    use crate::ports::{MembershipStore, PaymentError};

    fn command(plan_id: PlanId, discount: Option<&str>) -> ProcessPaymentCommand {
        ProcessPaymentCommand {
            user_id: UserId::new(SEED_USER_ID).unwrap(),
            email: "user@example.com".to_string(),
            name: "Plain User".to_string(),
            plan_id,
            payment_method: "pm_card_visa".to_string(),
            discount_code: discount.map(str::to_string),
            signup_access_code: None,
            idempotency_key: None,
        }
    }

    fn handler(store: Arc<dyn DataStore>, provider: &MockPaymentProvider) -> ProcessPaymentHandler {
        ProcessPaymentHandler::new(store, Arc::new(provider.clone()), Arc::new(LoggingNotifier))
    }

    #[tokio::test]
    async fn charges_discounted_price_and_creates_membership() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let provider = MockPaymentProvider::new();

        let result = handler(store.clone(), &provider)
            .handle(command(PlanId::MaintenancePremium, Some("premium20")))
            .await
            .unwrap();

        assert_eq!(result.summary.original_price, 24999);
        assert_eq!(result.summary.discount_amount, 5000);
        assert_eq!(result.summary.final_price, 19999);
        assert_eq!(
            provider.calls(),
            vec![MockCall::PaymentIntent {
                amount_cents: 19999,
                user_id: SEED_USER_ID.to_string()
            }]
        );
        assert!(result.membership.unwrap().success);
        let code = store.get_discount_code("PREMIUM20").await.unwrap().unwrap();
        assert_eq!(code.current_uses, 1);
    }

    #[tokio::test]
    async fn discounted_buyer_is_emailed_the_charged_price() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = ProcessPaymentHandler::new(
            store,
            Arc::new(MockPaymentProvider::new()),
            notifier.clone(),
        );

        handler
            .handle(command(PlanId::MaintenancePremium, Some("PREMIUM20")))
            .await
            .unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].monthly_price_cents, 19999);
        assert!(sent[0].text_body().contains("$199.99"));
        assert!(!sent[0].text_body().contains("$249.99"));
    }

    #[tokio::test]
    async fn invalid_discount_stops_before_charging() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let provider = MockPaymentProvider::new();

        let err = handler(store, &provider)
            .handle(command(PlanId::MaintenanceBasic, Some("PREMIUM20")))
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Discount code is not valid for this plan");
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn declined_card_creates_nothing() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let provider = MockPaymentProvider::new();
        let mut cmd = command(PlanId::MaintenanceBasic, None);
        cmd.payment_method = DECLINED_PAYMENT_METHOD.to_string();

        let err = handler(store.clone(), &provider).handle(cmd).await.unwrap_err();

        assert!(matches!(err, MembershipError::PaymentFailed { .. }));
        let user = UserId::new(SEED_USER_ID).unwrap();
        assert!(store.get_membership(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn action_required_returns_client_secret_only() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        let provider = MockPaymentProvider::new();
        let mut cmd = command(PlanId::MaintenanceBasic, None);
        cmd.payment_method = ACTION_REQUIRED_PAYMENT_METHOD.to_string();

        let result = handler(store.clone(), &provider).handle(cmd).await.unwrap();

        assert_eq!(result.status, PaymentIntentStatus::RequiresAction);
        assert!(result.client_secret.is_some());
        assert!(result.membership.is_none());
    }

    #[tokio::test]
    async fn provider_outage_is_infrastructure() {
        let provider = MockPaymentProvider::new();
        provider.fail_next(PaymentError::network("connection reset"));

        let err = handler(Arc::new(InMemoryStore::seeded().unwrap()), &provider)
            .handle(command(PlanId::MaintenanceBasic, None))
            .await
            .unwrap_err();
        assert!(matches!(err, MembershipError::Infrastructure(_)));
    }

    #[tokio::test]
    async fn full_discount_skips_the_charge() {
        let store = Arc::new(InMemoryStore::seeded().unwrap());
        store
            .create_discount_code(
                &DiscountCode::new("FREEMONTH", PlanScope::All, 100, "", 5, Timestamp::now().add_days(5))
                    .unwrap(),
            )
            .await
            .unwrap();
        let provider = MockPaymentProvider::new();

        let result = handler(store, &provider)
            .handle(command(PlanId::MaintenanceElite, Some("FREEMONTH")))
            .await
            .unwrap();

        assert_eq!(result.summary.final_price, 0);
        assert!(result.payment_intent_id.is_none());
        assert!(result.membership.is_some());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_increment_does_not_fail_the_purchase() {
        let store = Arc::new(FlakyStore::seeded());
        store.fail_increment();
        let provider = MockPaymentProvider::new();

        let result = handler(store, &provider)
            .handle(command(PlanId::MaintenanceBasic, Some("WELCOME10")))
            .await
            .unwrap();
        assert!(result.membership.is_some());
    }

    #[tokio::test]
    async fn blank_payment_method_is_rejected() {
        let mut cmd = command(PlanId::MaintenanceBasic, None);
        cmd.payment_method = "  ".to_string();

        let err = handler(Arc::new(InMemoryStore::seeded().unwrap()), &MockPaymentProvider::new())
            .handle(cmd)
            .await
            .unwrap_err();
        assert!(matches!(err, MembershipError::ValidationFailed { .. }));
    }
}
