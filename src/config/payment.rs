//! Payment configuration (Stripe)
//!
//! All keys are optional; without a secret key the process charges through
//! the in-process mock provider.

use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    #[serde(default)]
    pub stripe_secret_key: String,

    /// Handed to the browser for Stripe.js
    #[serde(default)]
    pub stripe_publishable_key: String,

    #[serde(default)]
    pub stripe_webhook_secret: String,

    /// Override for stripe-mock or tests
    pub stripe_api_base_url: Option<String>,
}

impl PaymentConfig {
    pub fn is_configured(&self) -> bool {
        !self.stripe_secret_key.is_empty()
    }

    pub fn is_live_mode(&self) -> bool {
        self.stripe_secret_key.starts_with("sk_live_")
    }

    /// `production` is passed so live keys can be refused elsewhere.
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if !self.is_configured() {
            if production {
                return Err(ValidationError::MissingRequired("payment.stripe_secret_key"));
            }
            return Ok(());
        }

        if !self.stripe_secret_key.starts_with("sk_") && !self.stripe_secret_key.starts_with("rk_")
        {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_publishable_key.is_empty() && !self.stripe_publishable_key.starts_with("pk_")
        {
            return Err(ValidationError::InvalidStripePublishableKey);
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("payment.stripe_webhook_secret"));
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if self.is_live_mode() && !production {
            return Err(ValidationError::LiveKeyOutsideProduction);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keys() -> PaymentConfig {
        PaymentConfig {
            stripe_secret_key: "sk_test_abc".to_string(),
            stripe_publishable_key: "pk_test_abc".to_string(),
            stripe_webhook_secret: "whsec_abc".to_string(),
            stripe_api_base_url: None,
        }
    }

    #[test]
    fn unconfigured_is_fine_outside_production() {
        let config = PaymentConfig::default();
        assert!(!config.is_configured());
        assert!(config.validate(false).is_ok());
        assert_eq!(
            config.validate(true),
            Err(ValidationError::MissingRequired("payment.stripe_secret_key"))
        );
    }

    #[test]
    fn test_keys_validate() {
        assert!(test_keys().validate(false).is_ok());
    }

    #[test]
    fn bad_prefixes_are_rejected() {
        let config = PaymentConfig {
            stripe_secret_key: "pk_test_wrong".to_string(),
            ..test_keys()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidStripeKey));

        let config = PaymentConfig {
            stripe_webhook_secret: "secret".to_string(),
            ..test_keys()
        };
        assert_eq!(
            config.validate(false),
            Err(ValidationError::InvalidStripeWebhookSecret)
        );
    }

    #[test]
    fn live_keys_need_production() {
        let config = PaymentConfig {
            stripe_secret_key: "sk_live_abc".to_string(),
            ..test_keys()
        };
        assert_eq!(
            config.validate(false),
            Err(ValidationError::LiveKeyOutsideProduction)
        );
        assert!(config.validate(true).is_ok());
    }
}
