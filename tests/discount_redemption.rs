//! Discount code redemption across purchases.

use std::sync::Arc;

use detailing_membership::adapters::email::LoggingNotifier;
use detailing_membership::adapters::memory::InMemoryStore;
use detailing_membership::adapters::stripe::{MockCall, MockPaymentProvider};
use detailing_membership::application::handlers::{
    ProcessPaymentCommand, ProcessPaymentHandler, ValidateAndGetDiscountHandler,
    ValidateDiscountQuery,
};
use detailing_membership::domain::codes::{DiscountCode, PlanScope};
use detailing_membership::domain::foundation::{Timestamp, UserId};
use detailing_membership::domain::membership::{MembershipError, PlanId};
use detailing_membership::ports::{DiscountCodeStore, MembershipStore};

fn purchase(user: &str, code: &str) -> ProcessPaymentCommand {
    ProcessPaymentCommand {
        user_id: UserId::new(user).unwrap(),
        email: format!("{}@example.com", user),
        name: user.to_string(),
        plan_id: PlanId::MaintenanceBasic,
        payment_method: "pm_card_visa".to_string(),
        discount_code: Some(code.to_string()),
        signup_access_code: None,
        idempotency_key: None,
    }
}

async fn store_with(code: DiscountCode) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.create_discount_code(&code).await.unwrap();
    store
}

#[tokio::test]
async fn single_use_code_is_exhausted_after_one_purchase() {
    let code = DiscountCode::new(
        "ONCE50",
        PlanScope::All,
        50,
        "Half off, once",
        1,
        Timestamp::now().add_days(7),
    )
    .unwrap();
    let store = store_with(code).await;
    let provider = MockPaymentProvider::new();
    let handler = ProcessPaymentHandler::new(
        store.clone(),
        Arc::new(provider.clone()),
        Arc::new(LoggingNotifier),
    );

    let first = handler.handle(purchase("first-buyer", "once50")).await.unwrap();
    assert!(first.membership.is_some());
    assert_eq!(first.summary.discount_percentage, 50);
    assert!(first.summary.final_price < first.summary.original_price);

    let stored = store.get_discount_code("ONCE50").await.unwrap().unwrap();
    assert_eq!(stored.current_uses, 1);

    let err = handler
        .handle(purchase("second-buyer", "ONCE50"))
        .await
        .unwrap_err();
    assert!(matches!(err, MembershipError::InvalidDiscountCode { .. }));

    // Only the first buyer was charged.
    let charges = provider
        .calls()
        .into_iter()
        .filter(|c| matches!(c, MockCall::PaymentIntent { .. }))
        .count();
    assert_eq!(charges, 1);

    let second = UserId::new("second-buyer").unwrap();
    assert!(store.get_membership(&second).await.unwrap().is_none());

    let validation = ValidateAndGetDiscountHandler::new(store.clone())
        .handle(ValidateDiscountQuery {
            code: "once50".to_string(),
            plan_id: PlanId::MaintenanceBasic,
        })
        .await
        .unwrap();
    assert!(!validation.valid);
    assert_eq!(validation.error.as_deref(), Some("Discount code limit reached"));
}

#[tokio::test]
async fn plan_scoped_code_rejects_other_plans() {
    let code = DiscountCode::new(
        "ELITEONLY",
        PlanScope::Plan(PlanId::MaintenanceElite),
        25,
        "",
        10,
        Timestamp::now().add_days(7),
    )
    .unwrap();
    let store = store_with(code).await;
    let handler = ValidateAndGetDiscountHandler::new(store);

    let basic = handler
        .handle(ValidateDiscountQuery {
            code: "ELITEONLY".to_string(),
            plan_id: PlanId::MaintenanceBasic,
        })
        .await
        .unwrap();
    assert!(!basic.valid);

    let elite = handler
        .handle(ValidateDiscountQuery {
            code: "ELITEONLY".to_string(),
            plan_id: PlanId::MaintenanceElite,
        })
        .await
        .unwrap();
    assert!(elite.valid);
    assert_eq!(elite.discount.unwrap().discount_percentage, 25);
}

#[tokio::test]
async fn concurrent_increments_are_not_lost() {
    let code = DiscountCode::new(
        "BULK",
        PlanScope::All,
        5,
        "",
        1_000,
        Timestamp::now().add_days(7),
    )
    .unwrap();
    let store = store_with(code).await;

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.increment_discount_code_uses("bulk").await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = store.get_discount_code("BULK").await.unwrap().unwrap();
    assert_eq!(stored.current_uses, 32);
}
