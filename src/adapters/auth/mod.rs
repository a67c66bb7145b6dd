//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `firebase` - Production Firebase Auth implementation (ID tokens and session cookies)
//! - `mock` - Test implementation that doesn't require external services

mod firebase;
mod mock;

pub use firebase::{FirebaseConfig, FirebaseSessionValidator};
pub use mock::MockSessionValidator;
