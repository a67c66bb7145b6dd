//! HTTP adapter for operator diagnostics and maintenance.
//!
//! Only uids listed in `auth.admin_uids` may call these routes.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::admin_routes;
