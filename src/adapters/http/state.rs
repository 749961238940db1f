//! Shared state for the HTTP router.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::application::handlers::{
    CancelMembershipHandler, GetMembersWithAccessCodesHandler, HandlePaymentWebhookHandler,
    ProcessPaymentHandler, StartCheckoutHandler, ValidateAndGetDiscountHandler,
};
use crate::adapters::session::StaticTokenVerifier;
use crate::ports::{DataStore, MembershipNotifier, PaymentProvider, TokenVerifier};

const DEFAULT_PUBLIC_URL: &str = "http://localhost:5173";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Store served on `/api/db`, and the secret callers must present.
#[derive(Clone)]
pub struct RpcEndpoint {
    pub store: Arc<dyn DataStore>,
    pub secret: SecretString,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    /// `None` disables the relational RPC endpoint.
    pub rpc: Option<RpcEndpoint>,
    /// Resolves bearer tokens; rejects everything until one is installed.
    pub tokens: Arc<dyn TokenVerifier>,
    pub payments: Arc<dyn PaymentProvider>,
    pub notifier: Arc<dyn MembershipNotifier>,
    /// Shared so processed event ids survive across requests.
    pub webhooks: Arc<HandlePaymentWebhookHandler>,
    /// Base URL of the customer-facing site, used for checkout redirects.
    pub public_url: String,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DataStore>,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn MembershipNotifier>,
    ) -> Self {
        Self {
            webhooks: Arc::new(HandlePaymentWebhookHandler::new(
                store.clone(),
                payments.clone(),
                notifier.clone(),
            )),
            store,
            rpc: None,
            tokens: Arc::new(StaticTokenVerifier::empty()),
            payments,
            notifier,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_rpc_store(mut self, store: Arc<dyn DataStore>, secret: SecretString) -> Self {
        self.rpc = Some(RpcEndpoint { store, secret });
        self
    }

    pub fn with_token_verifier(mut self, tokens: Arc<dyn TokenVerifier>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn discount_handler(&self) -> ValidateAndGetDiscountHandler {
        ValidateAndGetDiscountHandler::new(self.store.clone())
    }

    pub fn payment_handler(&self) -> ProcessPaymentHandler {
        ProcessPaymentHandler::new(self.store.clone(), self.payments.clone(), self.notifier.clone())
    }

    pub fn checkout_handler(&self) -> StartCheckoutHandler {
        StartCheckoutHandler::new(self.store.clone(), self.payments.clone())
    }

    pub fn members_handler(&self) -> GetMembersWithAccessCodesHandler {
        GetMembersWithAccessCodesHandler::new(self.store.clone())
    }

    pub fn cancel_handler(&self) -> CancelMembershipHandler {
        CancelMembershipHandler::new(self.store.clone())
    }
}
