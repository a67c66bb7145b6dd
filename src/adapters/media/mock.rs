//! Mock media storage for testing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::r2::{join_public_url, validate_key};
use crate::ports::{MediaStorage, MediaStorageError};

/// Returns predictable URLs and records presigned keys.
#[derive(Clone, Default)]
pub struct MockMediaStorage {
    presigned: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MockMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every presign call fail with a provider error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn presigned_keys(&self) -> Vec<String> {
        self.presigned
            .lock()
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MediaStorage for MockMediaStorage {
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, MediaStorageError> {
        if self.fail {
            return Err(MediaStorageError::Provider("mock failure".to_string()));
        }
        validate_key(key)?;
        if let Ok(mut keys) = self.presigned.lock() {
            keys.push(key.to_string());
        }
        Ok(format!(
            "https://upload.test/{}?content-type={}&expires={}",
            key,
            content_type,
            expires_in.as_secs()
        ))
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url("https://media.test", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_presigned_keys() {
        let storage = MockMediaStorage::new();
        let url = storage
            .presign_upload("uploads/a/b.png", "image/png", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(url.contains("expires=60"));
        assert_eq!(storage.presigned_keys(), vec!["uploads/a/b.png".to_string()]);
        assert_eq!(storage.public_url("uploads/a/b.png"), "https://media.test/uploads/a/b.png");
    }

    #[tokio::test]
    async fn failing_storage_errors() {
        let storage = MockMediaStorage::failing();
        let result = storage
            .presign_upload("uploads/a/b.png", "image/png", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(MediaStorageError::Provider(_))));
    }
}
