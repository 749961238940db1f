//! Backend selection.
//!
//! Resolved once at startup from `StorageConfig`; the rest of the process
//! only sees the `DataStore`, `SessionSource` and `TokenVerifier` trait
//! objects.

use std::fmt;
use std::sync::Arc;

use secrecy::SecretString;

use crate::config::StorageConfig;
use crate::domain::foundation::DomainError;
use crate::ports::{DataStore, SessionSource, TokenVerifier};

use super::hosted::{HostedClient, HostedSessionSource, HostedStore, HostedTokenVerifier};
use super::memory::InMemoryStore;
use super::rpc::RpcStore;
use super::session::{LocalSessionSource, NoSessionSource, StaticTokenVerifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Mock,
    RelationalRpc,
    Hosted,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mock => "mock",
            BackendKind::RelationalRpc => "relational_rpc",
            BackendKind::Hosted => "hosted",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active data store, where sessions come from, and who vouches for
/// bearer tokens.
#[derive(Clone)]
pub struct Backend {
    pub kind: BackendKind,
    pub store: Arc<dyn DataStore>,
    pub sessions: Arc<dyn SessionSource>,
    /// Seeded development tokens on the mock backend, none on RPC.
    pub tokens: Arc<dyn TokenVerifier>,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").field("kind", &self.kind).finish()
    }
}

/// Which backend `config` selects, without building it.
pub fn backend_kind(config: &StorageConfig) -> BackendKind {
    if config.use_relational_rpc {
        BackendKind::RelationalRpc
    } else if config.hosted_credentials().is_some() {
        BackendKind::Hosted
    } else {
        BackendKind::Mock
    }
}

/// Builds the backend `config` selects.
///
/// # Errors
///
/// The RPC backend fails without a shared secret; the mock backend fails if
/// its seed data does not validate.
pub fn select_backend(config: &StorageConfig) -> Result<Backend, DomainError> {
    let kind = backend_kind(config);
    let backend = match kind {
        BackendKind::RelationalRpc => {
            let secret = config
                .rpc_secret()
                .ok_or_else(|| DomainError::validation("storage.rpc_secret", "required"))?;
            Backend {
                kind,
                store: Arc::new(RpcStore::new(
                    config.rpc_url.clone(),
                    SecretString::new(secret.to_string()),
                )),
                sessions: Arc::new(NoSessionSource),
                tokens: Arc::new(StaticTokenVerifier::empty()),
            }
        }
        BackendKind::Hosted => {
            let (url, anon_key) = config
                .hosted_credentials()
                .ok_or_else(|| DomainError::validation("storage", "hosted credentials missing"))?;
            let client = HostedClient::new(url, SecretString::new(anon_key.to_string()));
            let token = config
                .hosted_access_token
                .clone()
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::new);
            Backend {
                kind,
                store: Arc::new(HostedStore::new(client.clone())),
                sessions: Arc::new(HostedSessionSource::new(client.clone(), token)),
                tokens: Arc::new(HostedTokenVerifier::new(client)),
            }
        }
        BackendKind::Mock => Backend {
            kind,
            store: Arc::new(InMemoryStore::seeded()?),
            sessions: Arc::new(LocalSessionSource::new(&config.session_file)),
            tokens: Arc::new(
                StaticTokenVerifier::seeded()
                    .map_err(|e| DomainError::validation("tokens", e.to_string()))?,
            ),
        },
    };

    tracing::info!(backend = %backend.kind, "Storage backend selected");
    Ok(backend)
}
