//! Media storage adapters.
//!
//! - `R2MediaStorage` - S3-compatible object store (Cloudflare R2)
//! - `MockMediaStorage` - deterministic URLs for tests

mod mock;
mod r2;

pub use mock::MockMediaStorage;
pub use r2::{R2Config, R2MediaStorage};
