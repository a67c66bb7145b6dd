//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, auth types)
//! - `membership` - Per-user plan, status and usage counters
//! - `payment` - Provider events, webhook signatures, reconciliation state
//! - `purchase` - Purchase records, access grants, connected accounts

pub mod foundation;
pub mod membership;
pub mod payment;
pub mod purchase;
