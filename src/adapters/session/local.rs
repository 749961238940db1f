//! File-backed session source for local development.
//!
//! The signed-in user is a small JSON pointer on disk. A missing file means
//! nobody is signed in; `sign_out` removes it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::broadcast;

use crate::domain::foundation::{AuthError, SessionUser};
use crate::ports::{AuthChange, SessionSource};

const CHANGE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct LocalSessionSource {
    path: PathBuf,
    changes: broadcast::Sender<AuthChange>,
}

impl LocalSessionSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path: path.as_ref().to_path_buf(),
            changes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists `user` as the signed-in user.
    pub async fn sign_in(&self, user: &SessionUser) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AuthError::Storage(e.to_string()))?;
            }
        }
        let json =
            serde_json::to_vec_pretty(user).map_err(|e| AuthError::Storage(e.to_string()))?;
        fs::write(&self.path, json)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        tracing::debug!(user_id = %user.id, path = %self.path.display(), "Local session stored");
        let _ = self.changes.send(AuthChange::SignedIn(user.clone()));
        Ok(())
    }
}

#[async_trait]
impl SessionSource for LocalSessionSource {
    async fn current_user(&self) -> Result<Option<SessionUser>, AuthError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::Storage(e.to_string())),
        };

        match serde_json::from_slice::<SessionUser>(&bytes) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                // Corrupt pointer: treat as signed out.
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AuthError::Storage(e.to_string())),
        }
        let _ = self.changes.send(AuthChange::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<AuthChange>> {
        Some(self.changes.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use tempfile::TempDir;

    fn user() -> SessionUser {
        SessionUser::new(
            UserId::new("mock-member").unwrap(),
            Some("member@example.com".to_string()),
        )
    }

    #[tokio::test]
    async fn missing_file_means_signed_out() {
        let dir = TempDir::new().unwrap();
        let source = LocalSessionSource::new(dir.path().join("session.json"));
        assert_eq!(source.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn sign_in_persists_the_pointer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let source = LocalSessionSource::new(&path);

        source.sign_in(&user()).await.unwrap();

        assert!(path.exists());
        let reopened = LocalSessionSource::new(&path);
        assert_eq!(reopened.current_user().await.unwrap(), Some(user()));
    }

    #[tokio::test]
    async fn sign_out_removes_the_pointer_and_notifies() {
        let dir = TempDir::new().unwrap();
        let source = LocalSessionSource::new(dir.path().join("session.json"));
        source.sign_in(&user()).await.unwrap();
        let mut rx = source.subscribe().unwrap();

        source.sign_out().await.unwrap();

        assert_eq!(source.current_user().await.unwrap(), None);
        assert_eq!(rx.recv().await.unwrap(), AuthChange::SignedOut);
    }

    #[tokio::test]
    async fn sign_out_without_session_is_ok() {
        let dir = TempDir::new().unwrap();
        let source = LocalSessionSource::new(dir.path().join("session.json"));
        assert!(source.sign_out().await.is_ok());
    }

    #[tokio::test]
    async fn corrupt_pointer_reads_as_signed_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();
        let source = LocalSessionSource::new(&path);
        assert_eq!(source.current_user().await.unwrap(), None);
    }
}
