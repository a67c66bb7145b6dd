//! In-memory webhook event log.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, EventId, Timestamp};
use crate::domain::payment::{ProcessingState, VerifiedEvent};
use crate::ports::{ClaimResult, WebhookEventRecord, WebhookEventRepository};

#[derive(Debug, Default, Clone)]
pub struct InMemoryWebhookEventRepository {
    events: Arc<RwLock<HashMap<EventId, WebhookEventRecord>>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    async fn update(
        &self,
        event_id: &EventId,
        apply: impl FnOnce(&mut WebhookEventRecord) + Send,
    ) -> Result<(), DomainError> {
        let mut events = self.events.write().await;
        let record = events
            .get_mut(event_id)
            .ok_or_else(|| DomainError::not_found("webhook event", event_id))?;
        apply(record);
        Ok(())
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn claim(&self, event: &VerifiedEvent, now: Timestamp) -> Result<ClaimResult, DomainError> {
        let mut events = self.events.write().await;
        match events.get_mut(event.id()) {
            None => {
                events.insert(event.id().clone(), WebhookEventRecord::processing(event, now));
                Ok(ClaimResult::Claimed { attempt: 1 })
            }
            Some(record) if record.state == ProcessingState::Recorded => {
                Ok(ClaimResult::AlreadyRecorded)
            }
            Some(record) => {
                record.state = ProcessingState::Processing;
                record.attempts += 1;
                record.updated_at = now;
                Ok(ClaimResult::Claimed {
                    attempt: record.attempts,
                })
            }
        }
    }

    async fn mark_recorded(&self, event_id: &EventId, now: Timestamp) -> Result<(), DomainError> {
        self.update(event_id, |record| {
            record.state = ProcessingState::Recorded;
            record.last_error = None;
            record.updated_at = now;
        })
        .await
    }

    async fn mark_failed(
        &self,
        event_id: &EventId,
        error: &str,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let error = error.to_string();
        self.update(event_id, move |record| {
            record.state = ProcessingState::Failed;
            record.last_error = Some(error);
            record.updated_at = now;
        })
        .await
    }

    async fn find(&self, event_id: &EventId) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.events.read().await.get(event_id).cloned())
    }

    async fn list_recent(
        &self,
        state: Option<ProcessingState>,
        limit: u32,
    ) -> Result<Vec<WebhookEventRecord>, DomainError> {
        let events = self.events.read().await;
        let mut matching: Vec<_> = events
            .values()
            .filter(|r| state.map_or(true, |s| r.state == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|_, r| r.state == ProcessingState::Processing || !r.received_at.is_before(&cutoff));
        Ok((before - events.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentEvent;

    fn event(id: &str) -> VerifiedEvent {
        VerifiedEvent::new(
            EventId::new(id).unwrap(),
            "product.created",
            Timestamp::now(),
            false,
            PaymentEvent::Unknown("product.created".to_string()),
            serde_json::json!({"id": id}),
        )
    }

    // ══════════════════════════════════════════════════════════════
    // Claiming
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn first_claim_inserts_processing_row() {
        let repo = InMemoryWebhookEventRepository::new();
        let result = repo.claim(&event("evt_1"), Timestamp::now()).await.unwrap();

        assert_eq!(result, ClaimResult::Claimed { attempt: 1 });
        let record = repo.find(&EventId::new("evt_1").unwrap()).await.unwrap().unwrap();
        assert_eq!(record.state, ProcessingState::Processing);
        assert_eq!(record.payload["id"], "evt_1");
    }

    #[tokio::test]
    async fn recorded_event_is_not_reclaimed() {
        let repo = InMemoryWebhookEventRepository::new();
        let e = event("evt_1");
        repo.claim(&e, Timestamp::now()).await.unwrap();
        repo.mark_recorded(e.id(), Timestamp::now()).await.unwrap();

        assert_eq!(
            repo.claim(&e, Timestamp::now()).await.unwrap(),
            ClaimResult::AlreadyRecorded
        );
    }

    #[tokio::test]
    async fn failed_event_is_reclaimed_with_bumped_attempt() {
        let repo = InMemoryWebhookEventRepository::new();
        let e = event("evt_1");
        repo.claim(&e, Timestamp::now()).await.unwrap();
        repo.mark_failed(e.id(), "db down", Timestamp::now()).await.unwrap();

        assert_eq!(
            repo.claim(&e, Timestamp::now()).await.unwrap(),
            ClaimResult::Claimed { attempt: 2 }
        );
        let record = repo.find(e.id()).await.unwrap().unwrap();
        assert_eq!(record.last_error.as_deref(), Some("db down"));
    }

    #[tokio::test]
    async fn in_flight_event_is_reclaimed_immediately() {
        let repo = InMemoryWebhookEventRepository::new();
        let e = event("evt_1");
        repo.claim(&e, Timestamp::now()).await.unwrap();

        assert_eq!(
            repo.claim(&e, Timestamp::now()).await.unwrap(),
            ClaimResult::Claimed { attempt: 2 }
        );
        let record = repo.find(e.id()).await.unwrap().unwrap();
        assert_eq!(record.state, ProcessingState::Processing);
    }

    // ══════════════════════════════════════════════════════════════
    // Listing and pruning
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn list_recent_filters_by_state() {
        let repo = InMemoryWebhookEventRepository::new();
        for id in ["evt_1", "evt_2", "evt_3"] {
            repo.claim(&event(id), Timestamp::now()).await.unwrap();
        }
        repo.mark_failed(&EventId::new("evt_2").unwrap(), "x", Timestamp::now())
            .await
            .unwrap();

        let failed = repo.list_recent(Some(ProcessingState::Failed), 10).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].event_id.as_str(), "evt_2");
        assert_eq!(repo.list_recent(None, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_before_keeps_in_flight_events() {
        let repo = InMemoryWebhookEventRepository::new();
        let old = Timestamp::now().minus_days(40);
        let done = event("evt_done");
        let busy = event("evt_busy");
        repo.claim(&done, old).await.unwrap();
        repo.mark_recorded(done.id(), old).await.unwrap();
        repo.claim(&busy, old).await.unwrap();

        let deleted = repo.delete_before(Timestamp::now().minus_days(30)).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(repo.find(busy.id()).await.unwrap().is_some());
    }
}
