//! Session context.
//!
//! Holds who is signed in together with their profile and active
//! membership. Constructed once per process with the store and a session
//! source. `init` loads the session and follows auth changes until
//! `teardown`.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::domain::foundation::{AuthError, SessionUser};
use crate::domain::membership::Membership;
use crate::domain::profile::Profile;
use crate::ports::{AuthChange, DataStore, MembershipStore, ProfileStore, SessionSource};

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub loading: bool,
    pub user: Option<SessionUser>,
    pub profile: Option<Profile>,
    pub membership: Option<Membership>,
    pub is_member: bool,
    pub is_admin: bool,
}

impl SessionSnapshot {
    /// Loads profile and active membership for `user`.
    ///
    /// Store failures leave the affected field empty; they are logged, not
    /// returned.
    pub async fn load(store: &dyn DataStore, user: Option<SessionUser>) -> Self {
        let Some(user) = user else {
            return Self::default();
        };

        let profile = match store.get_profile(&user.id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Profile lookup failed");
                None
            }
        };
        let membership = match store.get_active_membership(&user.id).await {
            Ok(membership) => membership,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Membership lookup failed");
                None
            }
        };

        Self {
            loading: false,
            is_member: membership.as_ref().is_some_and(Membership::is_active),
            is_admin: profile.as_ref().is_some_and(Profile::is_admin),
            user: Some(user),
            profile,
            membership,
        }
    }
}

struct Shared {
    store: Arc<dyn DataStore>,
    sessions: Arc<dyn SessionSource>,
    snapshot: RwLock<SessionSnapshot>,
}

impl Shared {
    async fn reload(&self) -> SessionSnapshot {
        self.snapshot.write().await.loading = true;

        let user = match self.sessions.current_user().await {
            Ok(user) => user,
            Err(AuthError::InvalidToken) => None,
            Err(e) => {
                tracing::warn!(error = %e, transient = e.is_transient(), "Session lookup failed");
                None
            }
        };
        let next = SessionSnapshot::load(self.store.as_ref(), user).await;

        tracing::debug!(
            user_id = next.user.as_ref().map(|u| u.id.as_str()).unwrap_or("anonymous"),
            is_member = next.is_member,
            is_admin = next.is_admin,
            "Session loaded"
        );
        *self.snapshot.write().await = next.clone();
        next
    }
}

pub struct SessionContext {
    shared: Arc<Shared>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn DataStore>, sessions: Arc<dyn SessionSource>) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                sessions,
                snapshot: RwLock::new(SessionSnapshot {
                    loading: true,
                    ..SessionSnapshot::default()
                }),
            }),
            listener: Mutex::new(None),
        }
    }

    /// Loads the session and starts following auth changes.
    ///
    /// Calling `init` again replaces the previous subscription.
    pub async fn init(&self) -> SessionSnapshot {
        let snapshot = self.shared.reload().await;

        let mut listener = self.listener.lock().await;
        if let Some(previous) = listener.take() {
            previous.abort();
        }
        if let Some(changes) = self.shared.sessions.subscribe() {
            *listener = Some(tokio::spawn(follow(self.shared.clone(), changes)));
        }
        snapshot
    }

    /// Stops following auth changes.
    pub async fn teardown(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
            tracing::debug!("Session listener stopped");
        }
    }

    /// Re-reads the session without touching the subscription.
    pub async fn refresh(&self) -> SessionSnapshot {
        self.shared.reload().await
    }

    /// Ends the session at the source, then reloads.
    pub async fn sign_out(&self) -> Result<SessionSnapshot, AuthError> {
        self.shared.sessions.sign_out().await?;
        Ok(self.shared.reload().await)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot.read().await.clone()
    }

    pub async fn loading(&self) -> bool {
        self.shared.snapshot.read().await.loading
    }

    pub async fn user(&self) -> Option<SessionUser> {
        self.shared.snapshot.read().await.user.clone()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.shared.snapshot.read().await.profile.clone()
    }

    pub async fn membership(&self) -> Option<Membership> {
        self.shared.snapshot.read().await.membership.clone()
    }

    pub async fn is_member(&self) -> bool {
        self.shared.snapshot.read().await.is_member
    }

    pub async fn is_admin(&self) -> bool {
        self.shared.snapshot.read().await.is_admin
    }

    pub async fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        if let Ok(mut listener) = self.listener.try_lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

async fn follow(shared: Arc<Shared>, mut changes: broadcast::Receiver<AuthChange>) {
    loop {
        match changes.recv().await {
            Ok(change) => {
                tracing::debug!(?change, "Auth state changed");
                shared.reload().await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Auth change notifications dropped; reloading");
                shared.reload().await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
