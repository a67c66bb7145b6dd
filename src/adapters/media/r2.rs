//! Cloudflare R2 implementation of MediaStorage.
//!
//! R2 speaks the S3 API, so this uses `aws-sdk-s3` with a custom endpoint
//! and path-style addressing. Uploads go straight from the client to the
//! bucket through presigned `PUT` URLs.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use http::Uri;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{MediaStorage, MediaStorageError};

/// Connection settings for an R2 bucket.
#[derive(Clone)]
pub struct R2Config {
    /// `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    /// R2 ignores regions but the SDK requires one.
    pub region: String,
    /// Base URL objects are publicly served from.
    pub public_base_url: String,
}

impl std::fmt::Debug for R2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("R2Config")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

pub struct R2MediaStorage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl R2MediaStorage {
    pub async fn new(config: R2Config) -> Result<Self, MediaStorageError> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        Uri::from_str(&endpoint)
            .map_err(|e| MediaStorageError::Provider(format!("invalid R2 endpoint: {}", e)))?;

        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key.expose_secret().to_string(),
            None,
            None,
            "r2-s3-compatible",
        );

        let region = Region::new(config.region);
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region.clone())
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .region(region)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MediaStorage for R2MediaStorage {
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, MediaStorageError> {
        validate_key(key)?;

        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| MediaStorageError::Provider(format!("invalid expiry: {}", e)))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| {
                tracing::error!(key, error = %e, "Failed to presign upload");
                MediaStorageError::Provider(e.to_string())
            })?;

        Ok(request.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.public_base_url, key)
    }
}

pub(super) fn validate_key(key: &str) -> Result<(), MediaStorageError> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|s| s == "..") {
        return Err(MediaStorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub(super) fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
