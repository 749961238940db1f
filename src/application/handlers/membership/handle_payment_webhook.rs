//! HandlePaymentWebhookHandler - Stripe webhook processing.
//!
//! Verifies the signature, then dispatches on event type:
//! - `checkout.session.completed` (paid) and
//!   `checkout.session.async_payment_succeeded` create the membership from
//!   the session metadata and count the discount code use.
//! - `checkout.session.async_payment_failed` is logged.
//! - `charge.refunded` marks the user's latest membership refunded.
//! - Anything else is accepted and logged.
//!
//! Stripe delivers at least once. The most recent event ids are remembered
//! so a redelivery is acknowledged without side effects. Memory is capped at
//! `PROCESSED_EVENT_CAPACITY` ids; the oldest is forgotten first.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::application::handlers::payment::payment_error_to_membership;
use crate::domain::foundation::{MembershipId, UserId};
use crate::domain::membership::{MembershipError, PaymentStatus};
use crate::ports::{
    CustomerMetadata, DataStore, DiscountCodeStore, MembershipNotifier, MembershipStore,
    PaymentProvider, WebhookEvent, WebhookEventData, WebhookEventType,
};

use super::{CreateMembershipCommand, CreateMembershipWithAccessCodeHandler};

/// Checkout payment statuses that mean the money has arrived.
const SETTLED_PAYMENT_STATUSES: [&str; 2] = ["paid", "no_payment_required"];

/// Stripe redelivers for up to three days; this covers well past that at
/// normal signup volume.
const PROCESSED_EVENT_CAPACITY: usize = 10_000;

/// Insertion-ordered set of event ids with a fixed capacity.
#[derive(Debug)]
struct RecentEvents {
    order: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl RecentEvents {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            seen: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// `false` when `id` is already present.
    fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
                tracing::debug!(event_id = %oldest, "Forgetting processed webhook event");
            }
        }
        self.order.push_back(id.to_string());
        self.seen.insert(id.to_string());
        true
    }

    fn remove(&mut self, id: &str) {
        if self.seen.remove(id) {
            self.order.retain(|existing| existing != id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.order.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    MembershipCreated {
        membership_id: MembershipId,
        access_code: String,
    },
    MembershipRefunded {
        membership_id: MembershipId,
    },
    /// Event id already handled.
    Duplicate,
    /// Accepted without state changes.
    Ignored,
}

pub struct HandlePaymentWebhookHandler {
    store: Arc<dyn DataStore>,
    provider: Arc<dyn PaymentProvider>,
    create_membership: CreateMembershipWithAccessCodeHandler,
    processed: Mutex<RecentEvents>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        store: Arc<dyn DataStore>,
        provider: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn MembershipNotifier>,
    ) -> Self {
        Self {
            create_membership: CreateMembershipWithAccessCodeHandler::new(store.clone(), notifier),
            store,
            provider,
            processed: Mutex::new(RecentEvents::new(PROCESSED_EVENT_CAPACITY)),
        }
    }

    /// Remembers at most `capacity` processed event ids.
    pub fn with_event_capacity(self, capacity: usize) -> Self {
        Self {
            processed: Mutex::new(RecentEvents::new(capacity)),
            ..self
        }
    }

    pub async fn handle(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, MembershipError> {
        let event = self
            .provider
            .verify_webhook(payload, signature)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Webhook rejected");
                payment_error_to_membership(e)
            })?;

        // Claimed up front so concurrent redeliveries do not both apply.
        if !self.processed.lock().await.insert(&event.id) {
            tracing::info!(event_id = %event.id, "Duplicate webhook event");
            return Ok(WebhookOutcome::Duplicate);
        }

        let result = self.dispatch(&event).await;
        if result.is_err() {
            // Let the provider's redelivery retry it.
            self.processed.lock().await.remove(&event.id);
        }
        result
    }

    async fn dispatch(&self, event: &WebhookEvent) -> Result<WebhookOutcome, MembershipError> {
        match (&event.event_type, &event.data) {
            (
                WebhookEventType::CheckoutSessionCompleted,
                WebhookEventData::Checkout { session_id, payment_status, amount_total, metadata },
            ) => {
                let settled = payment_status
                    .as_deref()
                    .map_or(false, |s| SETTLED_PAYMENT_STATUSES.contains(&s));
                if !settled {
                    tracing::info!(
                        event_id = %event.id,
                        session_id = %session_id,
                        payment_status = ?payment_status,
                        "Checkout completed before payment settled; waiting for async result"
                    );
                    return Ok(WebhookOutcome::Ignored);
                }
                self.activate(event, session_id, *amount_total, metadata).await
            }
            (
                WebhookEventType::CheckoutSessionAsyncPaymentSucceeded,
                WebhookEventData::Checkout { session_id, amount_total, metadata, .. },
            ) => self.activate(event, session_id, *amount_total, metadata).await,
            (
                WebhookEventType::CheckoutSessionAsyncPaymentFailed,
                WebhookEventData::Checkout { session_id, metadata, .. },
            ) => {
                tracing::warn!(
                    event_id = %event.id,
                    session_id = %session_id,
                    user_id = metadata.get("user_id").map(String::as_str).unwrap_or("unknown"),
                    "Checkout payment failed"
                );
                Ok(WebhookOutcome::Ignored)
            }
            (WebhookEventType::ChargeRefunded, WebhookEventData::Charge { charge_id, metadata, .. }) => {
                self.refund(event, charge_id, metadata).await
            }
            (event_type, _) => {
                tracing::info!(event_id = %event.id, ?event_type, "Unhandled webhook event");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    /// `amount_total` is what the session charged; the confirmation quotes it.
    async fn activate(
        &self,
        event: &WebhookEvent,
        session_id: &str,
        amount_total: Option<i64>,
        metadata: &HashMap<String, String>,
    ) -> Result<WebhookOutcome, MembershipError> {
        let customer = CustomerMetadata::from_map(metadata).map_err(|e| {
            tracing::error!(event_id = %event.id, session_id, error = %e, "Checkout metadata incomplete");
            MembershipError::validation("metadata", e.to_string())
        })?;

        let mut command = CreateMembershipCommand::paid(
            customer.user_id.clone(),
            customer.email.clone(),
            customer.name.clone(),
            customer.plan_id,
        );
        match amount_total {
            Some(charged) => command = command.at_price(charged),
            None if customer.discount_code.is_some() => tracing::warn!(
                event_id = %event.id,
                session_id,
                "Discounted checkout without amount_total; confirming list price"
            ),
            None => {}
        }

        let created = self.create_membership.handle(command).await?;

        if let Some(code) = &customer.discount_code {
            if let Err(e) = self.store.increment_discount_code_uses(code).await {
                tracing::warn!(code = %code, error = %e, "Discount use not counted");
            }
        }

        tracing::info!(
            event_id = %event.id,
            session_id,
            user_id = %customer.user_id,
            membership_id = %created.membership.id,
            "Membership activated from checkout"
        );
        Ok(WebhookOutcome::MembershipCreated {
            membership_id: created.membership.id,
            access_code: created.access_code.code,
        })
    }

    async fn refund(
        &self,
        event: &WebhookEvent,
        charge_id: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<WebhookOutcome, MembershipError> {
        let Some(user_id) = metadata.get("user_id").and_then(|id| UserId::new(id.clone()).ok())
        else {
            tracing::warn!(event_id = %event.id, charge_id, "Refunded charge carries no user id");
            return Ok(WebhookOutcome::Ignored);
        };

        let Some(mut membership) = self.store.get_membership(&user_id).await? else {
            tracing::warn!(event_id = %event.id, user_id = %user_id, "Refund for user without membership");
            return Ok(WebhookOutcome::Ignored);
        };

        if membership.payment_status == PaymentStatus::Refunded {
            return Ok(WebhookOutcome::Ignored);
        }
        membership.mark_refunded();
        let membership = self.store.upsert_membership(&membership).await?;

        tracing::info!(
            event_id = %event.id,
            charge_id,
            user_id = %user_id,
            membership_id = %membership.id,
            "Membership marked refunded"
        );
        Ok(WebhookOutcome::MembershipRefunded {
            membership_id: membership.id,
        })
    }
}
