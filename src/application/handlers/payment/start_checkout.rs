//! StartCheckoutHandler - hosted checkout session.
//!
//! The membership is created later by the checkout webhook.

use std::sync::Arc;

use serde::Serialize;

use crate::application::handlers::discount::ValidateAndGetDiscountHandler;
use crate::domain::foundation::UserId;
use crate::domain::membership::{MembershipError, PlanId};
use crate::domain::pricing::CheckoutSummary;
use crate::ports::{CreateCheckoutRequest, CustomerMetadata, DataStore, PaymentProvider};

use super::payment_error_to_membership;
use super::process_payment::price;

#[derive(Debug, Clone)]
pub struct StartCheckoutCommand {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub plan_id: PlanId,
    pub discount_code: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartCheckoutResult {
    pub session_id: String,
    pub url: String,
    pub summary: CheckoutSummary,
}

pub struct StartCheckoutHandler {
    provider: Arc<dyn PaymentProvider>,
    discounts: ValidateAndGetDiscountHandler,
}

impl StartCheckoutHandler {
    pub fn new(store: Arc<dyn DataStore>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            discounts: ValidateAndGetDiscountHandler::new(store),
            provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartCheckoutCommand,
    ) -> Result<StartCheckoutResult, MembershipError> {
        let summary = price(&self.discounts, cmd.plan_id, cmd.discount_code.as_deref()).await?;

        let session = self
            .provider
            .create_checkout_session(CreateCheckoutRequest {
                customer: CustomerMetadata {
                    user_id: cmd.user_id.clone(),
                    email: cmd.email,
                    name: cmd.name,
                    plan_id: cmd.plan_id,
                    discount_code: summary.discount_code.clone(),
                },
                amount_cents: summary.final_price,
                success_url: cmd.success_url,
                cancel_url: cmd.cancel_url,
            })
            .await
            .map_err(payment_error_to_membership)?;

        tracing::info!(
            user_id = %cmd.user_id,
            session_id = %session.id,
            amount_cents = summary.final_price,
            "Checkout started"
        );
        Ok(StartCheckoutResult {
            session_id: session.id,
            url: session.url,
            summary,
        })
    }
}
