//! In-process payment provider.
//!
//! Serves local development (no Stripe keys) and tests. Charges succeed
//! unless the payment method is one of Stripe's well-known decline test
//! tokens; errors and webhook events can be queued; calls are recorded.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentIntent, PaymentIntentRequest,
    PaymentIntentStatus, PaymentProvider, WebhookEvent,
};

/// Payment method that always declines.
pub const DECLINED_PAYMENT_METHOD: &str = "pm_card_chargeDeclined";

/// Payment method that needs 3-D Secure.
pub const ACTION_REQUIRED_PAYMENT_METHOD: &str = "pm_card_authenticationRequired";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    PaymentIntent { amount_cents: i64, user_id: String },
    Checkout { amount_cents: i64, user_id: String },
    Webhook,
}

#[derive(Default)]
struct MockState {
    sequence: u64,
    next_error: Option<PaymentError>,
    webhook_events: VecDeque<WebhookEvent>,
    reject_webhooks: bool,
    calls: Vec<MockCall>,
}

#[derive(Clone, Default)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose webhook verification always fails.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.state().reject_webhooks = true;
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state();
        state.sequence += 1;
        format!("{}_mock_{}", prefix, state.sequence)
    }

    /// Fail the next call with `error`.
    pub fn fail_next(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Queue the event returned by the next successful `verify_webhook`.
    pub fn push_webhook_event(&self, event: WebhookEvent) {
        self.state().webhook_events.push_back(event);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    fn take_error(&self) -> Option<PaymentError> {
        self.state().next_error.take()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        self.state().calls.push(MockCall::PaymentIntent {
            amount_cents: request.amount_cents,
            user_id: request.customer.user_id.to_string(),
        });
        if let Some(error) = self.take_error() {
            return Err(error);
        }

        let id = self.next_id("pi");
        let status = match request.payment_method.as_str() {
            DECLINED_PAYMENT_METHOD => return Err(PaymentError::card_declined("Your card was declined.")),
            ACTION_REQUIRED_PAYMENT_METHOD => PaymentIntentStatus::RequiresAction,
            _ => PaymentIntentStatus::Succeeded,
        };

        tracing::debug!(payment_intent_id = %id, ?status, "Mock payment intent");
        Ok(PaymentIntent {
            client_secret: Some(format!("{}_secret", id)),
            id,
            status,
        })
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.state().calls.push(MockCall::Checkout {
            amount_cents: request.amount_cents,
            user_id: request.customer.user_id.to_string(),
        });
        if let Some(error) = self.take_error() {
            return Err(error);
        }

        let id = self.next_id("cs");
        Ok(CheckoutSession {
            url: format!("{}?session_id={}", request.success_url, id),
            id,
        })
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        _signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        let queued = {
            let mut state = self.state();
            state.calls.push(MockCall::Webhook);
            if state.reject_webhooks {
                return Err(PaymentError::invalid_webhook("Invalid signature"));
            }
            state.webhook_events.pop_front()
        };

        match queued {
            Some(event) => Ok(event),
            None => serde_json::from_slice(payload)
                .map_err(|e| PaymentError::invalid_webhook(format!("Invalid JSON: {}", e))),
        }
    }
}
