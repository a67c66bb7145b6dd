//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `CREATOR_VAULT` prefix
//! and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use creator_vault::config::AppConfig;
//!
//! # fn main() -> Result<(), creator_vault::config::ConfigError> {
//! let config = AppConfig::load()?;
//! config.validate()?;
//!
//! println!("Server running on {}", config.server.socket_addr()?);
//! # Ok(())
//! # }
//! ```

mod auth;
mod database;
mod error;
mod limits;
mod payment;
mod server;
mod storage;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use limits::LimitsConfig;
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Authentication configuration (Firebase)
    pub auth: AuthConfig,

    /// Payment configuration (Stripe)
    pub payment: PaymentConfig,

    /// Object storage configuration (R2)
    pub storage: StorageConfig,

    /// Free tier quotas
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `CREATOR_VAULT` prefix
    /// 3. Uses `__` to separate nested values
    ///
    /// - `CREATOR_VAULT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CREATOR_VAULT__DATABASE__URL=...` -> `database.url = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CREATOR_VAULT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.payment.validate(&self.server.environment)?;
        self.storage.validate()?;
        self.limits.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

/// Splits a comma-separated setting, dropping blanks.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const MINIMAL_ENV: &[(&str, &str)] = &[
        ("CREATOR_VAULT__DATABASE__URL", "postgresql://test@localhost/test"),
        ("CREATOR_VAULT__AUTH__FIREBASE_PROJECT_ID", "creator-vault-test"),
        ("CREATOR_VAULT__PAYMENT__STRIPE_API_KEY", "sk_test_xxx"),
        ("CREATOR_VAULT__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx"),
        ("CREATOR_VAULT__PAYMENT__CREATOR_PRO_PRICE_ID", "price_pro"),
        ("CREATOR_VAULT__PAYMENT__CHECKOUT_SUCCESS_URL", "http://localhost:5173/ok"),
        ("CREATOR_VAULT__PAYMENT__CHECKOUT_CANCEL_URL", "http://localhost:5173/cancel"),
        ("CREATOR_VAULT__PAYMENT__PORTAL_RETURN_URL", "http://localhost:5173/account"),
        ("CREATOR_VAULT__PAYMENT__CONNECT_REFRESH_URL", "http://localhost:5173/connect"),
        ("CREATOR_VAULT__PAYMENT__CONNECT_RETURN_URL", "http://localhost:5173/connect/done"),
        ("CREATOR_VAULT__STORAGE__ENDPOINT", "https://acct.r2.cloudflarestorage.com"),
        ("CREATOR_VAULT__STORAGE__BUCKET", "media"),
        ("CREATOR_VAULT__STORAGE__ACCESS_KEY_ID", "key"),
        ("CREATOR_VAULT__STORAGE__SECRET_ACCESS_KEY", "secret"),
        ("CREATOR_VAULT__STORAGE__PUBLIC_BASE_URL", "https://media.example.com"),
    ];

    const OPTIONAL_ENV: &[&str] = &[
        "CREATOR_VAULT__SERVER__PORT",
        "CREATOR_VAULT__SERVER__ENVIRONMENT",
        "CREATOR_VAULT__LIMITS__FREE_DOWNLOADS_PER_PERIOD",
    ];

    fn set_minimal_env() {
        for (key, value) in MINIMAL_ENV {
            env::set_var(key, value);
        }
    }

    fn clear_env() {
        for (key, _) in MINIMAL_ENV {
            env::remove_var(key);
        }
        for key in OPTIONAL_ENV {
            env::remove_var(key);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(&[]).unwrap();
        assert_eq!(
            config.database.url.expose_secret(),
            "postgresql://test@localhost/test"
        );
        assert_eq!(config.auth.firebase_project_id, "creator-vault-test");
        assert_eq!(config.payment.creator_pro_price_id, "price_pro");
        assert_eq!(config.storage.bucket, "media");
    }

    #[test]
    fn test_validate_full_config() {
        let config = load_with(&[]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_apply() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.limits.free_downloads_per_period, 5);
        assert_eq!(config.limits.free_bundles, 3);
        assert_eq!(config.auth.session_cookie_name, "__session");
    }

    #[test]
    fn test_overrides() {
        let config = load_with(&[
            ("CREATOR_VAULT__SERVER__PORT", "3000"),
            ("CREATOR_VAULT__LIMITS__FREE_DOWNLOADS_PER_PERIOD", "10"),
        ])
        .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.limits.free_tier().downloads_per_period, 10);
    }

    #[test]
    fn test_production_with_test_key_fails_validation() {
        let config = load_with(&[("CREATOR_VAULT__SERVER__ENVIRONMENT", "production")]).unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }
}
