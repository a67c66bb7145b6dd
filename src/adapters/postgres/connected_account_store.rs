//! PostgreSQL implementation of ConnectedAccountStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{corrupt_row, db_error, ts};
use crate::domain::foundation::{CreatorId, DomainError};
use crate::domain::purchase::ConnectedAccount;
use crate::ports::ConnectedAccountStore;

#[derive(Clone)]
pub struct PostgresConnectedAccountStore {
    pool: PgPool,
}

impl PostgresConnectedAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConnectedAccountRow {
    creator_id: String,
    account_id: String,
    charges_enabled: bool,
    payouts_enabled: bool,
    details_submitted: bool,
    refreshed_at: DateTime<Utc>,
}

impl TryFrom<ConnectedAccountRow> for ConnectedAccount {
    type Error = DomainError;

    fn try_from(row: ConnectedAccountRow) -> Result<Self, Self::Error> {
        Ok(ConnectedAccount {
            creator_id: CreatorId::new(row.creator_id)
                .map_err(|e| corrupt_row("connected_accounts", e))?,
            account_id: row.account_id,
            charges_enabled: row.charges_enabled,
            payouts_enabled: row.payouts_enabled,
            details_submitted: row.details_submitted,
            refreshed_at: ts(row.refreshed_at),
        })
    }
}

#[async_trait]
impl ConnectedAccountStore for PostgresConnectedAccountStore {
    async fn find(&self, creator_id: &CreatorId) -> Result<Option<ConnectedAccount>, DomainError> {
        let row: Option<ConnectedAccountRow> =
            sqlx::query_as("SELECT * FROM connected_accounts WHERE creator_id = $1")
                .bind(creator_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find connected account", e))?;

        row.map(ConnectedAccount::try_from).transpose()
    }

    async fn find_by_account_id(
        &self,
        account_id: &str,
    ) -> Result<Option<ConnectedAccount>, DomainError> {
        let row: Option<ConnectedAccountRow> =
            sqlx::query_as("SELECT * FROM connected_accounts WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find connected account", e))?;

        row.map(ConnectedAccount::try_from).transpose()
    }

    async fn upsert(&self, account: &ConnectedAccount) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO connected_accounts (
                creator_id, account_id, charges_enabled, payouts_enabled,
                details_submitted, refreshed_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (creator_id) DO UPDATE SET
                account_id = EXCLUDED.account_id,
                charges_enabled = EXCLUDED.charges_enabled,
                payouts_enabled = EXCLUDED.payouts_enabled,
                details_submitted = EXCLUDED.details_submitted,
                refreshed_at = EXCLUDED.refreshed_at
            "#,
        )
        .bind(account.creator_id.as_str())
        .bind(&account.account_id)
        .bind(account.charges_enabled)
        .bind(account.payouts_enabled)
        .bind(account.details_submitted)
        .bind(account.refreshed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save connected account", e))?;

        Ok(())
    }
}
