//! HTTP adapter for purchases and access checks.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::purchase_routes;
