//! Authentication configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::split_list;

/// Authentication configuration (Firebase Auth)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Firebase project id; audience of both credential kinds
    pub firebase_project_id: String,

    /// Signing key cache TTL in seconds
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,

    /// Cookie holding the Firebase session cookie
    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,

    /// Operator uids (comma-separated)
    pub admin_uids: Option<String>,
}

impl AuthConfig {
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    pub fn admin_uid_list(&self) -> Vec<String> {
        self.admin_uids.as_deref().map(split_list).unwrap_or_default()
    }

    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.firebase_project_id.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__FIREBASE_PROJECT_ID"));
        }
        // Project ids are lowercase letters, digits and hyphens.
        let valid = self
            .firebase_project_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(ValidationError::InvalidFirebaseProject);
        }
        if self.session_cookie_name.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__SESSION_COOKIE_NAME"));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            firebase_project_id: String::new(),
            jwks_cache_ttl_secs: default_jwks_cache_ttl(),
            session_cookie_name: default_session_cookie_name(),
            admin_uids: None,
        }
    }
}

fn default_jwks_cache_ttl() -> u64 {
    3600
}

fn default_session_cookie_name() -> String {
    "__session".to_string()
}
