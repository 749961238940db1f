//! Storage backend configuration
//!
//! Decides which data store the process talks to. Resolution order:
//! relational RPC when `use_relational_rpc` is set, hosted when both the
//! hosted URL and anon key are present, otherwise the seeded in-memory mock.

use serde::Deserialize;

use super::error::ValidationError;
use super::server::is_http_url;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub use_relational_rpc: bool,

    /// Relational RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Shared secret sent as `X-Rpc-Secret`, on both ends of the RPC route
    pub rpc_secret: Option<String>,

    pub hosted_url: Option<String>,

    pub hosted_anon_key: Option<String>,

    /// Pre-issued user token for the hosted auth service
    pub hosted_access_token: Option<String>,

    /// Session pointer file for the mock backend
    #[serde(default = "default_session_file")]
    pub session_file: String,
}

impl StorageConfig {
    /// Hosted URL and anon key, when both are set and non-blank.
    pub fn hosted_credentials(&self) -> Option<(&str, &str)> {
        let url = self.hosted_url.as_deref().filter(|s| !s.trim().is_empty())?;
        let key = self
            .hosted_anon_key
            .as_deref()
            .filter(|s| !s.trim().is_empty())?;
        Some((url, key))
    }

    /// The RPC secret, when set and non-blank.
    pub fn rpc_secret(&self) -> Option<&str> {
        self.rpc_secret.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.use_relational_rpc {
            if !is_http_url(&self.rpc_url) {
                return Err(ValidationError::InvalidUrl("storage.rpc_url"));
            }
            if self.rpc_secret().is_none() {
                return Err(ValidationError::MissingRequired("storage.rpc_secret"));
            }
        }

        let has_url = self
            .hosted_url
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        let has_key = self
            .hosted_anon_key
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if has_url != has_key && !self.use_relational_rpc {
            return Err(ValidationError::IncompleteHostedBackend);
        }
        if let Some((url, _)) = self.hosted_credentials() {
            if !is_http_url(url) {
                return Err(ValidationError::InvalidUrl("storage.hosted_url"));
            }
        }
        if self.session_file.trim().is_empty() {
            return Err(ValidationError::MissingRequired("storage.session_file"));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            use_relational_rpc: false,
            rpc_url: default_rpc_url(),
            rpc_secret: None,
            hosted_url: None,
            hosted_anon_key: None,
            hosted_access_token: None,
            session_file: default_session_file(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://localhost:8080/api/db".to_string()
}

fn default_session_file() -> String {
    ".detailing/session.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_nothing_remote() {
        let config = StorageConfig::default();
        assert!(!config.use_relational_rpc);
        assert!(config.hosted_credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hosted_needs_both_halves() {
        let config = StorageConfig {
            hosted_url: Some("https://project.hosted.example".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::IncompleteHostedBackend)
        );

        let config = StorageConfig {
            hosted_anon_key: Some("anon".to_string()),
            ..config
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.hosted_credentials(),
            Some(("https://project.hosted.example", "anon"))
        );
    }

    #[test]
    fn blank_hosted_values_count_as_absent() {
        let config = StorageConfig {
            hosted_url: Some("  ".to_string()),
            hosted_anon_key: Some("".to_string()),
            ..Default::default()
        };
        assert!(config.hosted_credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rpc_url_must_be_http() {
        let config = StorageConfig {
            use_relational_rpc: true,
            rpc_url: "localhost:8080".to_string(),
            rpc_secret: Some("shared".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidUrl("storage.rpc_url"))
        );
    }

    #[test]
    fn rpc_client_needs_a_secret() {
        let config = StorageConfig {
            use_relational_rpc: true,
            rpc_secret: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("storage.rpc_secret"))
        );

        let config = StorageConfig {
            rpc_secret: Some("shared".to_string()),
            ..config
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.rpc_secret(), Some("shared"));
    }
}
