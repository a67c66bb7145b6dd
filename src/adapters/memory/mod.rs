//! In-memory adapters for every storage port.
//!
//! Used by unit and integration tests. Each store serializes writes
//! behind one lock, matching the atomicity of the Postgres adapters.

mod connected_account_store;
mod entitlement_store;
mod membership_store;
mod webhook_event_repository;

pub use connected_account_store::InMemoryConnectedAccountStore;
pub use entitlement_store::InMemoryEntitlementStore;
pub use membership_store::InMemoryMembershipStore;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
