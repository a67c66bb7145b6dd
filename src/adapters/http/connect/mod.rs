//! HTTP adapter for creator Stripe Connect onboarding.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use routes::connect_routes;
