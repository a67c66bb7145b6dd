//! PresignUploadHandler - issues direct-to-bucket upload URLs.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::MediaStorage;

const MAX_FILE_NAME_LEN: usize = 100;

#[derive(Debug, Clone)]
pub struct PresignUploadCommand {
    pub uid: UserId,
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignUploadResult {
    pub key: String,
    pub upload_url: String,
    pub public_url: String,
    pub expires_in_secs: u64,
}

/// Handler for presigned upload URLs.
///
/// Keys are `uploads/<uid>/<uuid>-<sanitized name>`, so callers can only
/// write under their own prefix.
pub struct PresignUploadHandler {
    storage: Arc<dyn MediaStorage>,
    expires_in: Duration,
    allowed_content_types: Vec<String>,
}

impl PresignUploadHandler {
    pub fn new(
        storage: Arc<dyn MediaStorage>,
        expires_in: Duration,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            storage,
            expires_in,
            allowed_content_types,
        }
    }

    pub async fn handle(&self, cmd: PresignUploadCommand) -> Result<PresignUploadResult, DomainError> {
        let content_type = cmd.content_type.trim().to_ascii_lowercase();
        if !self.content_type_allowed(&content_type) {
            return Err(DomainError::validation(
                "contentType",
                format!("Content type '{}' is not allowed", content_type),
            ));
        }

        let name = sanitize_file_name(&cmd.file_name);
        if name.is_empty() {
            return Err(DomainError::validation("fileName", "File name is empty"));
        }

        let key = format!("uploads/{}/{}-{}", sanitize_segment(cmd.uid.as_str()), Uuid::new_v4(), name);
        let upload_url = self
            .storage
            .presign_upload(&key, &content_type, self.expires_in)
            .await?;

        tracing::debug!(uid = %cmd.uid, key = %key, "Presigned upload");
        Ok(PresignUploadResult {
            public_url: self.storage.public_url(&key),
            key,
            upload_url,
            expires_in_secs: self.expires_in.as_secs(),
        })
    }

    fn content_type_allowed(&self, content_type: &str) -> bool {
        self.allowed_content_types.iter().any(|allowed| {
            match allowed.strip_suffix("/*") {
                Some(prefix) => content_type
                    .split_once('/')
                    .is_some_and(|(major, _)| major == prefix),
                None => allowed == content_type,
            }
        })
    }
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
///
/// Leading dots are dropped so names can't be hidden files or `..`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_FILE_NAME_LEN)
        .collect()
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
