//! Detailing membership API server.
//!
//! ## REST Endpoints
//!
//! - `GET /api/checkout/summary` - Price breakdown for a plan and coupon
//! - `POST /api/discounts/validate` - Stored discount code check
//! - `POST /api/payments/intent` - Card payment and membership creation
//! - `POST /api/payments/checkout` - Hosted checkout session
//! - `POST /api/webhooks/stripe` - Stripe webhook handler
//! - `GET /api/admin/members` - Members with access codes (admin)
//! - `POST /api/admin/members/cancel` - Cancel a membership (admin)
//! - `GET /api/session` - Session snapshot for the caller
//! - `POST /api/db` - Relational RPC endpoint (when a database is configured)
//! - `GET /health` - Liveness probe

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::SecretString;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use detailing_membership::adapters::email::{
    LoggingNotifier, ResendNotifier, RetryPolicy, RetryingNotifier,
};
use detailing_membership::adapters::http::{api_router_with_cors, AppState};
use detailing_membership::adapters::postgres::PostgresStore;
use detailing_membership::adapters::session::StaticTokenVerifier;
use detailing_membership::adapters::{select_backend, BackendKind};
use detailing_membership::adapters::stripe::{
    MockPaymentProvider, StripeConfig, StripePaymentAdapter,
};
use detailing_membership::config::{AppConfig, EmailConfig, PaymentConfig, ServerConfig};
use detailing_membership::ports::{DataStore, MembershipNotifier, PaymentProvider, TokenVerifier};

/// Upper bound for the notification retry backoff.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.server)?;
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        port = config.server.port,
        "Starting detailing membership API"
    );

    let backend = select_backend(&config.storage)?;
    tracing::info!(backend = %backend.kind, "Storage backend selected");

    let payments = build_payments(&config.payment, config.is_production());
    let notifier = build_notifier(&config.email);

    let tokens: Arc<dyn TokenVerifier> =
        if config.is_production() && backend.kind == BackendKind::Mock {
            tracing::warn!("No auth service configured; every bearer token is rejected");
            Arc::new(StaticTokenVerifier::empty())
        } else {
            backend.tokens.clone()
        };

    let mut state = AppState::new(backend.store.clone(), payments, notifier)
        .with_token_verifier(tokens)
        .with_public_url(config.server.public_url.clone())
        .with_request_timeout(config.server.request_timeout());

    if let Some(database) = &config.database {
        let secret = config
            .storage
            .rpc_secret()
            .ok_or_else(|| anyhow::anyhow!("storage.rpc_secret is required with a database"))?;
        let postgres: Arc<dyn DataStore> = Arc::new(PostgresStore::connect_lazy(database)?);
        tracing::info!(database = %database.redacted_url(), "Relational RPC endpoint enabled");
        state = state.with_rpc_store(postgres, SecretString::new(secret.to_string()));
    }

    let app = api_router_with_cors(state, cors_layer(&config.server));

    let addr = config.server.socket_addr()?;
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if server.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    Ok(())
}

fn build_payments(payment: &PaymentConfig, production: bool) -> Arc<dyn PaymentProvider> {
    if !payment.is_configured() {
        tracing::warn!("Stripe keys not configured; using in-process payment provider");
        return Arc::new(MockPaymentProvider::new());
    }

    let mut stripe = StripeConfig::new(
        SecretString::new(payment.stripe_secret_key.clone()),
        SecretString::new(payment.stripe_webhook_secret.clone()),
    )
    .with_require_livemode(production && payment.is_live_mode());
    if let Some(base_url) = &payment.stripe_api_base_url {
        stripe = stripe.with_base_url(base_url.clone());
    }
    Arc::new(StripePaymentAdapter::new(stripe))
}

fn build_notifier(email: &EmailConfig) -> Arc<dyn MembershipNotifier> {
    let inner: Arc<dyn MembershipNotifier> = if email.is_enabled() {
        let api_key = Some(email.resend_api_key.clone())
            .filter(|k| !k.is_empty())
            .map(SecretString::new);
        let mut resend = ResendNotifier::new(api_key, email.from_header());
        if let Some(url) = &email.webhook_url {
            resend = resend.with_webhook_url(url.clone());
        }
        tracing::info!(endpoint = resend.endpoint(), "Confirmation emails enabled");
        Arc::new(resend)
    } else {
        tracing::warn!("Email not configured; confirmations are logged only");
        Arc::new(LoggingNotifier)
    };

    let policy = RetryPolicy::new(
        email.max_attempts,
        Duration::from_millis(email.retry_delay_ms),
        MAX_RETRY_DELAY,
    );
    Arc::new(RetryingNotifier::new(inner, policy))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
