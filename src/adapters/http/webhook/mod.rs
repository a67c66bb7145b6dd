//! HTTP adapter for the Stripe webhook.
//!
//! - `POST /webhook` - Stripe callback (no user auth, signature verified)

pub mod handlers;
pub mod routes;

pub use handlers::WebhookAck;
pub use routes::webhook_routes;
