//! PostgreSQL implementation of WebhookEventRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{corrupt_row, db_error, to_u32, ts};
use crate::domain::foundation::{DomainError, EventId, Timestamp};
use crate::domain::payment::{ProcessingState, VerifiedEvent};
use crate::ports::{ClaimResult, WebhookEventRecord, WebhookEventRepository};

#[derive(Clone)]
pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn set_state(
        &self,
        event_id: &EventId,
        state: ProcessingState,
        error: Option<&str>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_events SET state = $2, last_error = $3, updated_at = $4
            WHERE event_id = $1
            "#,
        )
        .bind(event_id.as_str())
        .bind(state.as_str())
        .bind(error)
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update webhook event", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("webhook event", event_id));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_id: String,
    event_type: String,
    state: String,
    attempts: i32,
    last_error: Option<String>,
    payload: serde_json::Value,
    received_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        Ok(WebhookEventRecord {
            event_id: EventId::new(row.event_id).map_err(|e| corrupt_row("webhook_events", e))?,
            event_type: row.event_type,
            state: row
                .state
                .parse::<ProcessingState>()
                .map_err(|e| corrupt_row("webhook_events", e))?,
            attempts: to_u32("webhook_events", row.attempts)?,
            last_error: row.last_error,
            payload: row.payload,
            received_at: ts(row.received_at),
            updated_at: ts(row.updated_at),
        })
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn claim(&self, event: &VerifiedEvent, now: Timestamp) -> Result<ClaimResult, DomainError> {
        // The conflict branch is skipped for recorded rows, so RETURNING
        // yields nothing and the event is reported as already recorded.
        let attempts: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO webhook_events (
                event_id, event_type, state, attempts, payload, received_at, updated_at
            ) VALUES ($1, $2, 'processing', 1, $3, $4, $4)
            ON CONFLICT (event_id) DO UPDATE SET
                state = 'processing',
                attempts = webhook_events.attempts + 1,
                updated_at = EXCLUDED.updated_at
            WHERE webhook_events.state <> 'recorded'
            RETURNING attempts
            "#,
        )
        .bind(event.id().as_str())
        .bind(event.event_type())
        .bind(event.payload())
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to claim webhook event", e))?;

        match attempts {
            Some(attempts) => Ok(ClaimResult::Claimed {
                attempt: to_u32("webhook_events", attempts)?,
            }),
            None => Ok(ClaimResult::AlreadyRecorded),
        }
    }

    async fn mark_recorded(&self, event_id: &EventId, now: Timestamp) -> Result<(), DomainError> {
        self.set_state(event_id, ProcessingState::Recorded, None, now)
            .await
    }

    async fn mark_failed(
        &self,
        event_id: &EventId,
        error: &str,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.set_state(event_id, ProcessingState::Failed, Some(error), now)
            .await
    }

    async fn find(&self, event_id: &EventId) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<WebhookEventRow> =
            sqlx::query_as("SELECT * FROM webhook_events WHERE event_id = $1")
                .bind(event_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find webhook event", e))?;

        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn list_recent(
        &self,
        state: Option<ProcessingState>,
        limit: u32,
    ) -> Result<Vec<WebhookEventRecord>, DomainError> {
        let rows: Vec<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT * FROM webhook_events
            WHERE ($1::TEXT IS NULL OR state = $1)
            ORDER BY received_at DESC
            LIMIT $2
            "#,
        )
        .bind(state.map(|s| s.as_str()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list webhook events", e))?;

        rows.into_iter().map(WebhookEventRecord::try_from).collect()
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM webhook_events
            WHERE received_at < $1 AND state IN ('recorded', 'failed')
            "#,
        )
        .bind(cutoff.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to prune webhook events", e))?;

        Ok(result.rows_affected())
    }
}
