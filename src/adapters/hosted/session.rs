//! Hosted auth: the session source for this process and the bearer-token
//! verifier for HTTP callers.
//!
//! Both resolve an access token against `/auth/v1/user`. The session source
//! also pushes auth changes to subscribers over a broadcast channel.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};

use crate::domain::foundation::{AuthError, SessionUser, UserId};
use crate::ports::{AuthChange, SessionSource, TokenVerifier};

use super::HostedClient;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct HostedUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

pub struct HostedSessionSource {
    client: HostedClient,
    access_token: RwLock<Option<SecretString>>,
    changes: broadcast::Sender<AuthChange>,
}

impl HostedSessionSource {
    pub fn new(client: HostedClient, access_token: Option<SecretString>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            client,
            access_token: RwLock::new(access_token),
            changes,
        }
    }

    /// Adopts a new access token and announces the signed-in user.
    pub async fn set_access_token(&self, token: SecretString) -> Result<(), AuthError> {
        *self.access_token.write().await = Some(token);
        match self.current_user().await? {
            Some(user) => {
                let _ = self.changes.send(AuthChange::SignedIn(user));
                Ok(())
            }
            None => Err(AuthError::InvalidToken),
        }
    }
}

/// `Ok(None)` when the auth service refuses the token.
async fn lookup_user(
    client: &HostedClient,
    token: &SecretString,
) -> Result<Option<SessionUser>, AuthError> {
    let response = client
        .request(Method::GET, &client.auth_url("user"), Some(token))
        .send()
        .await
        .map_err(|e| AuthError::service_unavailable(e.to_string()))?;

    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
        status if !status.is_success() => {
            return Err(AuthError::service_unavailable(format!(
                "auth lookup returned {}",
                status
            )))
        }
        _ => {}
    }

    let user: HostedUser = response
        .json()
        .await
        .map_err(|e| AuthError::service_unavailable(e.to_string()))?;
    let id = UserId::new(user.id).map_err(|_| AuthError::InvalidToken)?;
    Ok(Some(SessionUser::new(id, user.email)))
}

#[async_trait]
impl SessionSource for HostedSessionSource {
    async fn current_user(&self) -> Result<Option<SessionUser>, AuthError> {
        let token = self.access_token.read().await.clone();
        match token {
            Some(token) => lookup_user(&self.client, &token).await,
            None => Ok(None),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.access_token.write().await.take();
        if let Some(token) = token {
            let response = self
                .client
                .request(Method::POST, &self.client.auth_url("logout"), Some(&token))
                .send()
                .await;
            if let Err(e) = response {
                // Token is already dropped locally.
                tracing::warn!(error = %e, "Hosted logout request failed");
            }
        }
        let _ = self.changes.send(AuthChange::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<AuthChange>> {
        Some(self.changes.subscribe())
    }
}

/// Resolves HTTP bearer tokens with the hosted auth service.
#[derive(Clone)]
pub struct HostedTokenVerifier {
    client: HostedClient,
}

impl HostedTokenVerifier {
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenVerifier for HostedTokenVerifier {
    async fn verify(&self, token: &str) -> Result<SessionUser, AuthError> {
        let token = SecretString::new(token.to_string());
        lookup_user(&self.client, &token)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}
