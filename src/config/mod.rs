//! Application configuration
//!
//! Loaded from environment variables with the `config` and `dotenvy` crates.
//! Variables use the `DETAILING` prefix and `__` between nested keys. Every
//! section has defaults, so an empty environment yields a development setup
//! on the seeded in-memory store with mock payments and logged emails.
//!
//! # Example
//!
//! ```no_run
//! use detailing_membership::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod email;
mod error;
mod payment;
mod server;
mod storage;

pub use database::{DatabaseConfig, PoolConfig};
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};
pub use storage::StorageConfig;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL behind the relational RPC endpoint
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub payment: PaymentConfig,

    #[serde(default)]
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration from the environment
    ///
    /// Reads `.env` when present, then `DETAILING__*` variables:
    ///
    /// - `DETAILING__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `DETAILING__STORAGE__USE_RELATIONAL_RPC=true`
    /// - `DETAILING__DATABASE__URL=postgres://...`
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadError` when a value cannot be parsed into its field.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DETAILING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation across all sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
            if self.storage.rpc_secret().is_none() {
                return Err(ValidationError::MissingRequired("storage.rpc_secret"));
            }
        }
        self.storage.validate()?;
        self.payment.validate(self.is_production())?;
        self.email.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Environment variables are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "DETAILING__SERVER__PORT",
        "DETAILING__SERVER__ENVIRONMENT",
        "DETAILING__DATABASE__URL",
        "DETAILING__STORAGE__USE_RELATIONAL_RPC",
        "DETAILING__STORAGE__RPC_SECRET",
        "DETAILING__STORAGE__HOSTED_URL",
        "DETAILING__STORAGE__HOSTED_ANON_KEY",
        "DETAILING__PAYMENT__STRIPE_SECRET_KEY",
        "DETAILING__PAYMENT__STRIPE_WEBHOOK_SECRET",
        "DETAILING__EMAIL__WEBHOOK_URL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn empty_environment_loads_development_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert!(config.database.is_none());
        assert!(!config.storage.use_relational_rpc);
        assert!(!config.payment.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nested_values_are_read() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("DETAILING__SERVER__PORT", "3000");
        env::set_var("DETAILING__DATABASE__URL", "postgresql://localhost/detailing");
        env::set_var("DETAILING__STORAGE__USE_RELATIONAL_RPC", "true");
        env::set_var("DETAILING__EMAIL__WEBHOOK_URL", "https://hooks.example.com/mail");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.database.map(|d| d.url),
            Some("postgresql://localhost/detailing".to_string())
        );
        assert!(config.storage.use_relational_rpc);
        assert!(config.email.is_enabled());
    }

    #[test]
    fn serving_rpc_requires_the_shared_secret() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("DETAILING__DATABASE__URL", "postgresql://localhost/detailing");
        let without = AppConfig::load();
        env::set_var("DETAILING__STORAGE__RPC_SECRET", "shared");
        let with = AppConfig::load();
        clear_env();

        assert_eq!(
            without.unwrap().validate().unwrap_err(),
            ValidationError::MissingRequired("storage.rpc_secret")
        );
        assert!(with.unwrap().validate().is_ok());
    }

    #[test]
    fn production_requires_stripe() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("DETAILING__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }
}
