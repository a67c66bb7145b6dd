//! Data Transfer Objects for media uploads.

use serde::{Deserialize, Serialize};

use crate::application::handlers::media::PresignUploadResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub key: String,
    /// PUT the file body here with the same `Content-Type`.
    pub upload_url: String,
    pub public_url: String,
    pub expires_in_secs: u64,
}

impl From<PresignUploadResult> for UploadUrlResponse {
    fn from(result: PresignUploadResult) -> Self {
        Self {
            key: result.key,
            upload_url: result.upload_url,
            public_url: result.public_url,
            expires_in_secs: result.expires_in_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case() {
        let request: UploadUrlRequest =
            serde_json::from_str(r#"{"fileName":"cover.png","contentType":"image/png"}"#).unwrap();
        assert_eq!(request.file_name, "cover.png");
        assert_eq!(request.content_type, "image/png");
    }
}
