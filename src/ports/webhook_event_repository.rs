//! WebhookEventRepository port - the webhook event log.
//!
//! Tracks each provider event through `processing -> recorded | failed`
//! and keeps the raw payload for operator diagnostics.
//!
//! Stripe delivers at least once, so the same event id arrives again after
//! timeouts, 5xx responses, or lost acknowledgements.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventId, Timestamp};
use crate::domain::payment::{ProcessingState, VerifiedEvent};

/// Row in the webhook event log.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEventRecord {
    pub event_id: EventId,
    /// Provider type string, e.g. `checkout.session.completed`.
    pub event_type: String,
    pub state: ProcessingState,
    /// Number of times processing was started.
    pub attempts: u32,
    pub last_error: Option<String>,
    pub payload: serde_json::Value,
    pub received_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WebhookEventRecord {
    /// First claim of an event.
    pub fn processing(event: &VerifiedEvent, now: Timestamp) -> Self {
        Self {
            event_id: event.id().clone(),
            event_type: event.event_type().to_string(),
            state: ProcessingState::Processing,
            attempts: 1,
            last_error: None,
            payload: event.payload().clone(),
            received_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of claiming an event for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// Caller owns this attempt.
    Claimed { attempt: u32 },
    /// Event already reached `recorded`; nothing to do.
    AlreadyRecorded,
}

#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Moves an event into `processing`, inserting the row if unseen.
    ///
    /// Any row not yet `recorded` is reclaimed with the attempt counter
    /// bumped, including one still `processing`. There is no lease, so a
    /// redelivery that overlaps a running attempt dispatches the event
    /// again. Every dispatch writes idempotently.
    /// `recorded` rows are left alone.
    async fn claim(&self, event: &VerifiedEvent, now: Timestamp) -> Result<ClaimResult, DomainError>;

    async fn mark_recorded(&self, event_id: &EventId, now: Timestamp) -> Result<(), DomainError>;

    async fn mark_failed(
        &self,
        event_id: &EventId,
        error: &str,
        now: Timestamp,
    ) -> Result<(), DomainError>;

    async fn find(&self, event_id: &EventId) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Most recent events first, optionally filtered by state.
    async fn list_recent(
        &self,
        state: Option<ProcessingState>,
        limit: u32,
    ) -> Result<Vec<WebhookEventRecord>, DomainError>;

    /// Deletes finished (`recorded` or `failed`) events received before
    /// `cutoff`. Returns the number deleted.
    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}
