//! HTTP adapter for media uploads.
//!
//! - `POST /api/media/upload-url` - Presigned PUT URL for a new object

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::media_routes;
