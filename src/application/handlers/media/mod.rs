//! Media upload handlers.

mod presign_upload;

pub use presign_upload::{
    sanitize_file_name, PresignUploadCommand, PresignUploadHandler, PresignUploadResult,
};
