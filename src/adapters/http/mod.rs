//! HTTP adapters - REST API implementations.
//!
//! Each feature has its own `dto`, `handlers` and `routes`. All of them
//! share one `AppState`, and `build_router` assembles the application.

pub mod admin;
pub mod connect;
pub mod error;
pub mod media;
pub mod membership;
pub mod middleware;
pub mod purchases;
pub mod router;
pub mod state;
pub mod webhook;

pub use error::{ApiError, ErrorResponse};
pub use middleware::{AuthState, DEFAULT_SESSION_COOKIE};
pub use router::{build_router, RouterConfig};
pub use state::{AppState, HttpSettings};
