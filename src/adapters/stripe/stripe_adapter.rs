//! Stripe over its form-encoded REST API.
//!
//! A card purchase is one confirmed payment intent for the first month; the
//! redirect flow opens a Checkout session instead. Webhooks are accepted only
//! with a fresh `t=` timestamp and a matching `v1` HMAC over `"{t}.{body}"`.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, CustomerMetadata, PaymentError, PaymentErrorCode,
    PaymentIntent, PaymentIntentRequest, PaymentIntentStatus, PaymentProvider, WebhookEvent,
    WebhookEventData, WebhookEventType,
};

use super::webhook_types::{
    SignatureHeader, StripeCharge, StripeCheckoutSession, StripeErrorBody, StripePaymentIntent,
    StripeWebhookEvent,
};

/// Oldest signed timestamp accepted, in seconds.
const REPLAY_WINDOW_SECS: i64 = 300;

/// How far ahead of our clock a sender may be.
const CLOCK_SKEW_SECS: i64 = 60;

const STRIPE_API: &str = "https://api.stripe.com";

#[derive(Clone)]
pub struct StripeConfig {
    api_key: SecretString,
    /// `whsec_...`
    webhook_secret: SecretString,
    api_base_url: String,
    require_livemode: bool,
}

impl StripeConfig {
    pub fn new(api_key: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            api_key,
            webhook_secret,
            api_base_url: STRIPE_API.to_string(),
            require_livemode: false,
        }
    }

    /// Alternate API host, e.g. stripe-mock.
    pub fn with_base_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            api_base_url: url.trim_end_matches('/').to_string(),
            ..self
        }
    }

    /// Refuse events whose `livemode` flag is false.
    pub fn with_require_livemode(self, require_livemode: bool) -> Self {
        Self {
            require_livemode,
            ..self
        }
    }
}

/// Rejects timestamps outside `[now - REPLAY_WINDOW_SECS, now + CLOCK_SKEW_SECS]`.
fn check_freshness(signed_at: i64, now: i64) -> Result<(), PaymentError> {
    let age = now - signed_at;
    if age > REPLAY_WINDOW_SECS {
        tracing::warn!(signed_at, age_secs = age, "Stale webhook, treating as replay");
        return Err(PaymentError::invalid_webhook(format!(
            "Signature timestamp too old ({}s)",
            age
        )));
    }
    if age < -CLOCK_SKEW_SECS {
        tracing::warn!(signed_at, "Webhook signed in the future");
        return Err(PaymentError::invalid_webhook(
            "Signature timestamp is in the future",
        ));
    }
    Ok(())
}

pub struct StripePaymentAdapter {
    config: StripeConfig,
    client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// `metadata[user_id]=...` style form fields.
    fn metadata_params(prefix: &str, customer: &CustomerMetadata) -> Vec<(String, String)> {
        customer
            .to_pairs()
            .into_iter()
            .map(|(key, value)| (format!("{}[{}]", prefix, key), value))
            .collect()
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
        idempotency_key: Option<&str>,
        operation: &'static str,
    ) -> Result<T, PaymentError> {
        let mut request = self
            .client
            .post(format!("{}{}", self.config.api_base_url, path))
            .basic_auth(self.config.api_key.expose_secret(), None::<&str>)
            .form(params);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Stripe unreachable");
            PaymentError::network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                PaymentError::provider(format!("Unreadable Stripe response to {}: {}", operation, e))
            });
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(operation, %status, body = %body, "Stripe rejected request");
        Err(api_error(status, &body))
    }

    fn signature_matches(&self, payload: &[u8], header: &SignatureHeader) -> Result<bool, PaymentError> {
        let secret = self.config.webhook_secret.expose_secret();
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| PaymentError::provider(format!("Unusable webhook secret: {}", e)))?;
        mac.update(format!("{}.", header.timestamp).as_bytes());
        mac.update(payload);
        let digest = mac.finalize().into_bytes();

        Ok(header
            .v1_signatures
            .iter()
            .any(|candidate| bool::from(digest.as_slice().ct_eq(candidate.as_slice()))))
    }

    fn decode_event(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let raw: StripeWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::invalid_webhook(format!("Invalid JSON: {}", e)))?;

        if self.config.require_livemode && !raw.livemode {
            tracing::warn!(event_id = %raw.id, "Test-mode webhook refused");
            return Err(PaymentError::invalid_webhook("Test-mode events are not accepted"));
        }

        let event_type = WebhookEventType::from_provider(&raw.event_type);
        let data = extract_event_data(&event_type, &raw)?;

        Ok(WebhookEvent {
            id: raw.id,
            event_type,
            data,
            created_at: raw.created,
        })
    }
}

fn extract_event_data(
    event_type: &WebhookEventType,
    event: &StripeWebhookEvent,
) -> Result<WebhookEventData, PaymentError> {
    match event_type {
        WebhookEventType::CheckoutSessionCompleted
        | WebhookEventType::CheckoutSessionAsyncPaymentSucceeded
        | WebhookEventType::CheckoutSessionAsyncPaymentFailed => {
            let session: StripeCheckoutSession = serde_json::from_value(event.data.object.clone())
                .map_err(|e| {
                    PaymentError::invalid_webhook(format!("Invalid checkout session: {}", e))
                })?;
            Ok(WebhookEventData::Checkout {
                session_id: session.id,
                payment_status: session.payment_status,
                amount_total: session.amount_total,
                metadata: session.metadata,
            })
        }
        WebhookEventType::ChargeRefunded => {
            let charge: StripeCharge = serde_json::from_value(event.data.object.clone())
                .map_err(|e| PaymentError::invalid_webhook(format!("Invalid charge: {}", e)))?;
            Ok(WebhookEventData::Charge {
                charge_id: charge.id,
                payment_intent_id: charge.payment_intent,
                amount_refunded: charge.amount_refunded,
                metadata: charge.metadata,
            })
        }
        WebhookEventType::Unknown(_) => Ok(WebhookEventData::Raw {
            json: event.data.object.to_string(),
        }),
    }
}

/// Maps a non-2xx Stripe response to a payment error.
fn api_error(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<StripeErrorBody>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.error.message.clone())
        .unwrap_or_else(|| format!("Stripe API error: {}", body));

    let error_type = parsed.as_ref().and_then(|b| b.error.error_type.as_deref());
    let decline_code = parsed.as_ref().and_then(|b| b.error.decline_code.as_deref());

    let code = match (status.as_u16(), error_type, decline_code) {
        (_, _, Some("insufficient_funds")) => PaymentErrorCode::InsufficientFunds,
        (402, _, _) | (_, Some("card_error"), _) => PaymentErrorCode::CardDeclined,
        (401, _, _) => PaymentErrorCode::AuthenticationError,
        (429, _, _) => PaymentErrorCode::RateLimitExceeded,
        (400, _, _) | (_, Some("invalid_request_error"), _) => PaymentErrorCode::InvalidRequest,
        _ => PaymentErrorCode::ProviderError,
    };

    let error = PaymentError::new(code, message);
    match parsed.and_then(|b| b.error.code) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut params = vec![
            ("amount".to_string(), request.amount_cents.to_string()),
            ("currency".to_string(), request.currency.clone()),
            ("payment_method".to_string(), request.payment_method.clone()),
            ("confirm".to_string(), "true".to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
            (
                "automatic_payment_methods[allow_redirects]".to_string(),
                "never".to_string(),
            ),
            (
                "description".to_string(),
                format!("{} membership", request.customer.plan_id.display_name()),
            ),
        ];
        if !request.customer.email.is_empty() {
            params.push(("receipt_email".to_string(), request.customer.email.clone()));
        }
        params.extend(Self::metadata_params("metadata", &request.customer));

        let intent: StripePaymentIntent = self
            .post_form(
                "/v1/payment_intents",
                &params,
                request.idempotency_key.as_deref(),
                "create_payment_intent",
            )
            .await?;

        tracing::info!(
            payment_intent_id = %intent.id,
            status = %intent.status,
            user_id = %request.customer.user_id,
            "Payment intent created"
        );

        Ok(PaymentIntent {
            id: intent.id,
            status: PaymentIntentStatus::from_provider(&intent.status),
            client_secret: intent.client_secret,
        })
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "line_items[0][price_data][currency]".to_string(),
                "usd".to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.customer.plan_id.display_name().to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];
        if !request.customer.email.is_empty() {
            params.push(("customer_email".to_string(), request.customer.email.clone()));
        }
        params.extend(Self::metadata_params("metadata", &request.customer));
        // Refund events carry the charge, so the charge needs the metadata too.
        params.extend(Self::metadata_params(
            "payment_intent_data[metadata]",
            &request.customer,
        ));

        let session: StripeCheckoutSession = self
            .post_form(
                "/v1/checkout/sessions",
                &params,
                None,
                "create_checkout_session",
            )
            .await?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::provider("Checkout session has no URL"))?;

        tracing::info!(
            session_id = %session.id,
            user_id = %request.customer.user_id,
            "Checkout session created"
        );

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Malformed Stripe-Signature header");
            PaymentError::invalid_webhook(e.to_string())
        })?;

        check_freshness(header.timestamp, chrono::Utc::now().timestamp())?;
        if !self.signature_matches(payload, &header)? {
            tracing::warn!(signed_at = header.timestamp, "Webhook signature mismatch");
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }

        let event = self.decode_event(payload)?;
        tracing::info!(event_id = %event.id, event_type = ?event.event_type, "Webhook verified");
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::hex_encode;

    const SECRET: &str = "whsec_test_secret";

    fn adapter() -> StripePaymentAdapter {
        StripePaymentAdapter::new(StripeConfig::new(
            SecretString::new("sk_test_key".to_string()),
            SecretString::new(SECRET.to_string()),
        ))
    }

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        format!(
            "t={},v1={}",
            timestamp,
            hex_encode(&mac.finalize().into_bytes())
        )
    }

    fn checkout_payload(event_type: &str) -> String {
        format!(
            r#"{{
                "id": "evt_1",
                "type": "{}",
                "created": 1704067200,
                "livemode": false,
                "data": {{
                    "object": {{
                        "id": "cs_test_1",
                        "object": "checkout.session",
                        "payment_status": "paid",
                        "amount_total": 19999,
                        "metadata": {{
                            "user_id": "user-1",
                            "email": "a@example.com",
                            "name": "Alex",
                            "plan_id": "maintenance-premium",
                            "discount_code": "PREMIUM20"
                        }}
                    }}
                }}
            }}"#,
            event_type
        )
    }

    #[test]
    fn base_url_is_trimmed() {
        let config = StripeConfig::new(
            SecretString::new("k".to_string()),
            SecretString::new("s".to_string()),
        )
        .with_base_url("http://localhost:12111/");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    fn header_for(secret: &str, signed_at: i64, payload: &str) -> SignatureHeader {
        SignatureHeader::parse(&sign(secret, signed_at, payload)).unwrap()
    }

    #[test]
    fn correct_secret_matches() {
        let payload = r#"{"id":"evt_sig"}"#;
        let header = header_for(SECRET, 1_704_067_200, payload);
        assert!(adapter().signature_matches(payload.as_bytes(), &header).unwrap());
    }

    #[test]
    fn other_secret_or_edited_body_does_not_match() {
        let payload = r#"{"id":"evt_sig"}"#;
        let header = header_for("whsec_other", 1_704_067_200, payload);
        assert!(!adapter().signature_matches(payload.as_bytes(), &header).unwrap());

        let header = header_for(SECRET, 1_704_067_200, payload);
        assert!(!adapter().signature_matches(br#"{"id":"evt_sig2"}"#, &header).unwrap());
    }

    #[test]
    fn one_matching_v1_among_several_is_enough() {
        let payload = r#"{"id":"evt_sig"}"#;
        let signed = sign(SECRET, 1_704_067_200, payload);
        let good = signed.split("v1=").nth(1).unwrap();
        let header =
            SignatureHeader::parse(&format!("t=1704067200,v1={},v1={}", "ab".repeat(32), good))
                .unwrap();
        assert!(adapter().signature_matches(payload.as_bytes(), &header).unwrap());
    }

    #[test]
    fn freshness_window() {
        let now = 1_704_067_200;
        assert!(check_freshness(now, now).is_ok());
        assert!(check_freshness(now - REPLAY_WINDOW_SECS, now).is_ok());
        assert!(check_freshness(now + 30, now).is_ok());

        let stale = check_freshness(now - REPLAY_WINDOW_SECS - 1, now).unwrap_err();
        assert!(stale.message.contains("too old"), "{}", stale.message);

        let ahead = check_freshness(now + CLOCK_SKEW_SECS + 1, now).unwrap_err();
        assert!(ahead.message.contains("future"), "{}", ahead.message);
        assert_eq!(ahead.code, PaymentErrorCode::InvalidWebhook);
    }

    #[tokio::test]
    async fn replayed_event_is_refused_even_with_a_valid_signature() {
        let payload = checkout_payload("checkout.session.completed");
        let signature = sign(SECRET, chrono::Utc::now().timestamp() - 3600, &payload);
        let err = adapter()
            .verify_webhook(payload.as_bytes(), &signature)
            .await
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }

    #[test]
    fn checkout_completed_carries_metadata() {
        let event = adapter()
            .decode_event(checkout_payload("checkout.session.completed").as_bytes())
            .unwrap();
        assert_eq!(event.event_type, WebhookEventType::CheckoutSessionCompleted);
        match event.data {
            WebhookEventData::Checkout {
                session_id,
                payment_status,
                amount_total,
                metadata,
            } => {
                assert_eq!(session_id, "cs_test_1");
                assert_eq!(payment_status.as_deref(), Some("paid"));
                assert_eq!(amount_total, Some(19999));
                let customer = CustomerMetadata::from_map(&metadata).unwrap();
                assert_eq!(customer.discount_code.as_deref(), Some("PREMIUM20"));
            }
            other => panic!("unexpected data: {:?}", other),
        }
    }

    #[test]
    fn charge_refunded_is_parsed() {
        let payload = r#"{
            "id": "evt_2",
            "type": "charge.refunded",
            "created": 1704067200,
            "data": {"object": {
                "id": "ch_1",
                "payment_intent": "pi_1",
                "amount_refunded": 24999,
                "metadata": {"user_id": "user-1", "plan_id": "maintenance-premium"}
            }}
        }"#;
        let event = adapter().decode_event(payload.as_bytes()).unwrap();
        assert_eq!(event.event_type, WebhookEventType::ChargeRefunded);
        assert!(matches!(
            event.data,
            WebhookEventData::Charge { amount_refunded: 24999, .. }
        ));
    }

    #[test]
    fn unknown_event_keeps_raw_object() {
        let payload = r#"{
            "id": "evt_3",
            "type": "customer.created",
            "created": 1704067200,
            "data": {"object": {"id": "cus_1"}}
        }"#;
        let event = adapter().decode_event(payload.as_bytes()).unwrap();
        assert_eq!(
            event.event_type,
            WebhookEventType::Unknown("customer.created".to_string())
        );
        assert!(matches!(event.data, WebhookEventData::Raw { .. }));
    }

    #[test]
    fn test_mode_rejected_when_livemode_required() {
        let adapter = StripePaymentAdapter::new(
            StripeConfig::new(
                SecretString::new("k".to_string()),
                SecretString::new(SECRET.to_string()),
            )
            .with_require_livemode(true),
        );
        let err = adapter
            .decode_event(checkout_payload("checkout.session.completed").as_bytes())
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }

    #[test]
    fn api_errors_are_classified() {
        let declined = api_error(
            reqwest::StatusCode::PAYMENT_REQUIRED,
            r#"{"error":{"type":"card_error","code":"card_declined","message":"Your card was declined."}}"#,
        );
        assert_eq!(declined.code, PaymentErrorCode::CardDeclined);
        assert_eq!(declined.message, "Your card was declined.");
        assert_eq!(declined.provider_code.as_deref(), Some("card_declined"));

        let funds = api_error(
            reqwest::StatusCode::PAYMENT_REQUIRED,
            r#"{"error":{"type":"card_error","decline_code":"insufficient_funds"}}"#,
        );
        assert_eq!(funds.code, PaymentErrorCode::InsufficientFunds);

        let auth = api_error(reqwest::StatusCode::UNAUTHORIZED, "nope");
        assert_eq!(auth.code, PaymentErrorCode::AuthenticationError);
        assert!(auth.message.contains("nope"));

        let limited = api_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "{}");
        assert!(limited.retryable);
    }

    #[tokio::test]
    async fn verify_webhook_end_to_end() {
        let payload = checkout_payload("checkout.session.async_payment_succeeded");
        let signature = sign(SECRET, chrono::Utc::now().timestamp(), &payload);
        let event = adapter()
            .verify_webhook(payload.as_bytes(), &signature)
            .await
            .unwrap();
        assert_eq!(
            event.event_type,
            WebhookEventType::CheckoutSessionAsyncPaymentSucceeded
        );
    }

    #[tokio::test]
    async fn verify_webhook_rejects_malformed_header() {
        let err = adapter()
            .verify_webhook(b"{}", "garbage")
            .await
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }

    #[tokio::test]
    async fn unreachable_api_is_a_network_error() {
        let adapter = StripePaymentAdapter::new(
            StripeConfig::new(
                SecretString::new("k".to_string()),
                SecretString::new(SECRET.to_string()),
            )
            .with_base_url("http://127.0.0.1:9"),
        );
        let customer = CustomerMetadata {
            user_id: crate::domain::foundation::UserId::new("u1").unwrap(),
            email: String::new(),
            name: String::new(),
            plan_id: crate::domain::membership::PlanId::MaintenanceBasic,
            discount_code: None,
        };
        let err = adapter
            .create_payment_intent(PaymentIntentRequest {
                amount_cents: 14999,
                currency: "usd".to_string(),
                payment_method: "pm_card_visa".to_string(),
                customer,
                idempotency_key: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::NetworkError);
    }
}
