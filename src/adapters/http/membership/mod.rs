//! HTTP adapter for membership endpoints.
//!
//! - `GET /api/membership` - Ensure and return the caller's membership
//! - `POST /api/membership/checkout` - Start a creator_pro checkout
//! - `POST /api/membership/portal` - Open the Stripe billing portal
//! - `POST /api/usage/:counter/consume` - Check and consume a quota unit

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::{membership_routes, usage_routes};
