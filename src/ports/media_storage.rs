//! MediaStorage port - object storage for creator uploads.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

#[derive(Debug, Clone, Error)]
pub enum MediaStorageError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage provider error: {0}")]
    Provider(String),
}

impl From<MediaStorageError> for DomainError {
    fn from(err: MediaStorageError) -> Self {
        match err {
            MediaStorageError::InvalidKey(_) => DomainError::validation("key", err.to_string()),
            MediaStorageError::Provider(_) => {
                DomainError::new(ErrorCode::ExternalProviderError, err.to_string())
            }
        }
    }
}

/// Presigned-URL issuing object store.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Returns a URL that accepts a single `PUT` of `key` with this
    /// content type until `expires_in` elapses.
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, MediaStorageError>;

    /// Public URL under which `key` is served once uploaded.
    fn public_url(&self, key: &str) -> String;
}
