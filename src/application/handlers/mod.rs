//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations. Each
//! handler holds `Arc<dyn Port>` dependencies and exposes `handle`.

pub mod connect;
pub mod maintenance;
pub mod media;
pub mod membership;
pub mod purchase;
pub mod webhook;
