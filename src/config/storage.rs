//! Object storage configuration (Cloudflare R2)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::split_list;

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: String,

    pub bucket: String,

    pub access_key_id: String,

    pub secret_access_key: SecretString,

    #[serde(default = "default_region")]
    pub region: String,

    /// Base URL objects are publicly served from
    pub public_base_url: String,

    /// Lifetime of presigned upload URLs in seconds
    #[serde(default = "default_upload_url_ttl")]
    pub upload_url_ttl_secs: u64,

    /// Accepted upload content types (comma-separated, `type/*` allowed)
    #[serde(default = "default_allowed_types")]
    pub allowed_content_types: String,
}

impl StorageConfig {
    pub fn upload_url_ttl(&self) -> Duration {
        Duration::from_secs(self.upload_url_ttl_secs)
    }

    pub fn allowed_content_type_list(&self) -> Vec<String> {
        split_list(&self.allowed_content_types)
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__ENDPOINT"));
        }
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(ValidationError::InvalidUrl("STORAGE__ENDPOINT"));
        }
        if self.bucket.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__BUCKET"));
        }
        if self.access_key_id.is_empty() || self.secret_access_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__ACCESS_KEY_ID"));
        }
        if self.public_base_url.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__PUBLIC_BASE_URL"));
        }
        // SigV4 presigning caps at 7 days.
        if self.upload_url_ttl_secs < 60 || self.upload_url_ttl_secs > 7 * 24 * 3600 {
            return Err(ValidationError::InvalidUploadTtl);
        }
        if self.allowed_content_type_list().is_empty() {
            return Err(ValidationError::NoUploadTypes);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            bucket: String::new(),
            access_key_id: String::new(),
            secret_access_key: SecretString::new(String::new()),
            region: default_region(),
            public_base_url: String::new(),
            upload_url_ttl_secs: default_upload_url_ttl(),
            allowed_content_types: default_allowed_types(),
        }
    }
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_upload_url_ttl() -> u64 {
    900
}

fn default_allowed_types() -> String {
    "image/*,video/*,audio/*,application/pdf,application/zip".to_string()
}
