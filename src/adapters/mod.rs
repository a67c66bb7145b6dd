//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Firebase credential verification (and a mock)
//! - `http` - axum REST API and the Stripe webhook endpoint
//! - `media` - Cloudflare R2 presigned uploads (and a mock)
//! - `memory` - In-memory stores for tests
//! - `postgres` - sqlx/PostgreSQL stores
//! - `stripe` - Stripe REST client, webhook decoding (and a mock)

pub mod auth;
pub mod http;
pub mod media;
pub mod memory;
pub mod postgres;
pub mod stripe;
