//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key
    pub stripe_api_key: SecretString,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: SecretString,

    /// Recurring price for creator_pro
    pub creator_pro_price_id: String,

    /// Where Checkout sends the member after paying
    pub checkout_success_url: String,

    /// Where Checkout sends the member after abandoning
    pub checkout_cancel_url: String,

    /// Where the billing portal returns to
    pub portal_return_url: String,

    /// Connect onboarding link expired, start again
    pub connect_refresh_url: String,

    /// Connect onboarding finished
    pub connect_return_url: String,

    /// Reject test-mode webhook events
    #[serde(default)]
    pub require_livemode: bool,

    /// Upper bound on processing one webhook delivery
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,

    /// Timeout for Stripe REST calls
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_live_")
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    fn redirect_urls(&self) -> [(&'static str, &str); 5] {
        [
            ("PAYMENT__CHECKOUT_SUCCESS_URL", &self.checkout_success_url),
            ("PAYMENT__CHECKOUT_CANCEL_URL", &self.checkout_cancel_url),
            ("PAYMENT__PORTAL_RETURN_URL", &self.portal_return_url),
            ("PAYMENT__CONNECT_REFRESH_URL", &self.connect_refresh_url),
            ("PAYMENT__CONNECT_RETURN_URL", &self.connect_return_url),
        ]
    }

    /// Validate payment configuration
    ///
    /// Production requires a live key and HTTPS redirect URLs.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let api_key = self.stripe_api_key.expose_secret();
        let webhook_secret = self.stripe_webhook_secret.expose_secret();

        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"));
        }
        if webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__STRIPE_WEBHOOK_SECRET"));
        }
        // Restricted keys (rk_) work too.
        if !api_key.starts_with("sk_") && !api_key.starts_with("rk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.creator_pro_price_id.starts_with("price_") {
            return Err(ValidationError::InvalidStripePrice);
        }
        if self.webhook_timeout_secs == 0 || self.webhook_timeout_secs > 60 {
            return Err(ValidationError::InvalidWebhookTimeout);
        }

        let production = *environment == Environment::Production;
        if production && self.is_test_mode() {
            return Err(ValidationError::LiveKeyRequired);
        }
        for (name, url) in self.redirect_urls() {
            if url.is_empty() {
                return Err(ValidationError::MissingRequired(name));
            }
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidUrl(name));
            }
            if production && !url.starts_with("https://") {
                return Err(ValidationError::UrlMustBeHttps(name));
            }
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: SecretString::new(String::new()),
            stripe_webhook_secret: SecretString::new(String::new()),
            creator_pro_price_id: String::new(),
            checkout_success_url: String::new(),
            checkout_cancel_url: String::new(),
            portal_return_url: String::new(),
            connect_refresh_url: String::new(),
            connect_return_url: String::new(),
            require_livemode: false,
            webhook_timeout_secs: default_webhook_timeout(),
            api_timeout_secs: default_api_timeout(),
        }
    }
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_api_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn valid() -> PaymentConfig {
        PaymentConfig {
            stripe_api_key: secret("sk_test_abcd1234"),
            stripe_webhook_secret: secret("whsec_xyz789"),
            creator_pro_price_id: "price_creator_pro".to_string(),
            checkout_success_url: "http://localhost:5173/billing/success".to_string(),
            checkout_cancel_url: "http://localhost:5173/billing".to_string(),
            portal_return_url: "http://localhost:5173/account".to_string(),
            connect_refresh_url: "http://localhost:5173/connect/refresh".to_string(),
            connect_return_url: "http://localhost:5173/connect/done".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_key_modes() {
        assert!(valid().is_test_mode());
        let live = PaymentConfig {
            stripe_api_key: secret("sk_live_xxx"),
            ..valid()
        };
        assert!(live.is_live_mode());
        assert!(!live.is_test_mode());
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid().validate(&Environment::Development).is_ok());
    }

    #[test]
    fn test_validation_missing_api_key() {
        assert_eq!(
            PaymentConfig::default().validate(&Environment::Development),
            Err(ValidationError::MissingRequired("PAYMENT__STRIPE_API_KEY"))
        );
    }

    #[test]
    fn test_validation_invalid_prefixes() {
        let config = PaymentConfig {
            stripe_api_key: secret("pk_test_xxx"),
            ..valid()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidStripeKey)
        );

        let config = PaymentConfig {
            stripe_webhook_secret: secret("secret_xxx"),
            ..valid()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidStripeWebhookSecret)
        );
    }

    #[test]
    fn test_production_requires_live_key_and_https() {
        assert_eq!(
            valid().validate(&Environment::Production),
            Err(ValidationError::LiveKeyRequired)
        );

        let live = PaymentConfig {
            stripe_api_key: secret("sk_live_xxx"),
            ..valid()
        };
        assert_eq!(
            live.validate(&Environment::Production),
            Err(ValidationError::UrlMustBeHttps("PAYMENT__CHECKOUT_SUCCESS_URL"))
        );
    }

    #[test]
    fn test_secrets_are_redacted() {
        let debug = format!("{:?}", valid());
        assert!(!debug.contains("sk_test_abcd1234"));
        assert!(!debug.contains("whsec_xyz789"));
    }
}
