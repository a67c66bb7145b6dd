//! PruneWebhookEventsHandler - trims the webhook event log.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp, ValidationError};
use crate::ports::WebhookEventRepository;

/// Stripe retries for up to three days, so keep at least a week.
pub const MIN_RETENTION_DAYS: u32 = 7;

pub struct PruneWebhookEventsHandler {
    events: Arc<dyn WebhookEventRepository>,
}

impl PruneWebhookEventsHandler {
    pub fn new(events: Arc<dyn WebhookEventRepository>) -> Self {
        Self { events }
    }

    /// Deletes finished events older than `older_than_days`. Returns the count.
    pub async fn handle(&self, older_than_days: u32) -> Result<u64, DomainError> {
        if older_than_days < MIN_RETENTION_DAYS {
            return Err(ValidationError::out_of_range(
                "olderThanDays",
                i64::from(MIN_RETENTION_DAYS),
                i64::from(u32::MAX),
                i64::from(older_than_days),
            )
            .into());
        }
        let cutoff = Timestamp::now().minus_days(i64::from(older_than_days));
        let deleted = self.events.delete_before(cutoff).await?;
        tracing::info!(deleted, older_than_days, "Pruned webhook events");
        Ok(deleted)
    }
}
