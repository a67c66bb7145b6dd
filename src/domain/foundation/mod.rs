//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait, auth types
//! and error types used by every other domain module.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, CredentialKind};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CreatorId, EventId, ProductBoxId, PurchaseId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
