//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Identity
//!
//! - `SessionValidator` - Firebase ID token and session cookie verification
//!
//! ## Storage
//!
//! - `MembershipStore` - Per-user membership records and usage counters
//! - `EntitlementStore` - Purchase records and access grants
//! - `ConnectedAccountStore` - Cached creator payment accounts
//! - `WebhookEventRepository` - Webhook event log and processing state
//!
//! ## External services
//!
//! - `PaymentProvider` - Webhook verification and provider REST calls
//! - `MediaStorage` - Presigned uploads to object storage

mod connected_account_store;
mod entitlement_store;
mod media_storage;
mod membership_store;
mod payment_provider;
mod session_validator;
mod webhook_event_repository;

pub use connected_account_store::ConnectedAccountStore;
pub use entitlement_store::{EntitlementStore, SaveResult};
pub use media_storage::{MediaStorage, MediaStorageError};
pub use membership_store::MembershipStore;
pub use payment_provider::{
    CheckoutSession, PaymentError, PaymentErrorCode, PaymentProvider, PortalSession,
    RefundReceipt, SubscriptionCheckoutRequest,
};
pub use session_validator::SessionValidator;
pub use webhook_event_repository::{ClaimResult, WebhookEventRecord, WebhookEventRepository};
