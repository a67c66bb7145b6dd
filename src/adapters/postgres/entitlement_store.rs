//! PostgreSQL implementation of EntitlementStore.
//!
//! A purchase and its access grant are written in one transaction. Replays
//! never duplicate either row. A grant only moves to a new purchase when the
//! one it points at no longer grants access (repurchase after a refund).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{corrupt_row, db_error, ts};
use crate::domain::foundation::{
    CreatorId, DomainError, ErrorCode, ProductBoxId, PurchaseId, Timestamp, UserId,
};
use crate::domain::purchase::{AccessGrant, PurchaseGrant, PurchaseRecord, PurchaseStatus};
use crate::ports::{EntitlementStore, SaveResult};

/// PostgreSQL implementation of the EntitlementStore port.
#[derive(Clone)]
pub struct PostgresEntitlementStore {
    pool: PgPool,
}

impl PostgresEntitlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: String,
    buyer_uid: String,
    creator_id: Option<String>,
    product_box_id: String,
    amount: i64,
    currency: String,
    status: String,
    payment_intent_id: Option<String>,
    purchased_at: DateTime<Utc>,
    refunded_at: Option<DateTime<Utc>>,
}

impl TryFrom<PurchaseRow> for PurchaseRecord {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let creator_id = row
            .creator_id
            .map(CreatorId::new)
            .transpose()
            .map_err(|e| corrupt_row("purchases", e))?;

        Ok(PurchaseRecord {
            id: PurchaseId::new(row.id).map_err(|e| corrupt_row("purchases", e))?,
            buyer_uid: UserId::new(row.buyer_uid).map_err(|e| corrupt_row("purchases", e))?,
            creator_id,
            product_box_id: ProductBoxId::new(row.product_box_id)
                .map_err(|e| corrupt_row("purchases", e))?,
            amount: row.amount,
            currency: row.currency,
            status: row
                .status
                .parse::<PurchaseStatus>()
                .map_err(|e| corrupt_row("purchases", e))?,
            payment_intent_id: row.payment_intent_id,
            purchased_at: ts(row.purchased_at),
            refunded_at: row.refunded_at.map(ts),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    buyer_uid: String,
    product_box_id: String,
    purchase_id: String,
    granted_at: DateTime<Utc>,
}

impl TryFrom<GrantRow> for AccessGrant {
    type Error = DomainError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        Ok(AccessGrant {
            buyer_uid: UserId::new(row.buyer_uid).map_err(|e| corrupt_row("access_grants", e))?,
            product_box_id: ProductBoxId::new(row.product_box_id)
                .map_err(|e| corrupt_row("access_grants", e))?,
            purchase_id: PurchaseId::new(row.purchase_id)
                .map_err(|e| corrupt_row("access_grants", e))?,
            granted_at: ts(row.granted_at),
        })
    }
}

#[async_trait]
impl EntitlementStore for PostgresEntitlementStore {
    async fn record_purchase(&self, grant: &PurchaseGrant) -> Result<SaveResult, DomainError> {
        let purchase = grant.purchase();
        let access = grant.grant();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO purchases (
                id, buyer_uid, creator_id, product_box_id, amount, currency,
                status, payment_intent_id, purchased_at, refunded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(purchase.id.as_str())
        .bind(purchase.buyer_uid.as_str())
        .bind(purchase.creator_id.as_ref().map(|c| c.as_str()))
        .bind(purchase.product_box_id.as_str())
        .bind(purchase.amount)
        .bind(&purchase.currency)
        .bind(purchase.status.as_str())
        .bind(&purchase.payment_intent_id)
        .bind(purchase.purchased_at.as_datetime())
        .bind(purchase.refunded_at.map(|t| *t.as_datetime()))
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to insert purchase", e))?
        .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO access_grants (buyer_uid, product_box_id, purchase_id, granted_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (buyer_uid, product_box_id) DO UPDATE
               SET purchase_id = EXCLUDED.purchase_id,
                   granted_at = EXCLUDED.granted_at
             WHERE NOT EXISTS (
                       SELECT 1 FROM purchases prior
                       WHERE prior.id = access_grants.purchase_id AND prior.status = 'completed'
                   )
               AND EXISTS (
                       SELECT 1 FROM purchases latest
                       WHERE latest.id = EXCLUDED.purchase_id AND latest.status = 'completed'
                   )
            "#,
        )
        .bind(access.buyer_uid.as_str())
        .bind(access.product_box_id.as_str())
        .bind(access.purchase_id.as_str())
        .bind(access.granted_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to insert access grant", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit purchase", e))?;

        Ok(if inserted > 0 {
            SaveResult::Inserted
        } else {
            SaveResult::AlreadyExists
        })
    }

    async fn find_purchase(&self, id: &PurchaseId) -> Result<Option<PurchaseRecord>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as("SELECT * FROM purchases WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find purchase", e))?;

        row.map(PurchaseRecord::try_from).transpose()
    }

    async fn find_purchase_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PurchaseRecord>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            "SELECT * FROM purchases WHERE payment_intent_id = $1 ORDER BY purchased_at DESC LIMIT 1",
        )
        .bind(payment_intent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find purchase by payment intent", e))?;

        row.map(PurchaseRecord::try_from).transpose()
    }

    async fn list_purchases(&self, buyer: &UserId) -> Result<Vec<PurchaseRecord>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT * FROM purchases
            WHERE buyer_uid = $1
            ORDER BY purchased_at DESC, id
            "#,
        )
        .bind(buyer.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list purchases", e))?;

        rows.into_iter().map(PurchaseRecord::try_from).collect()
    }

    async fn find_grant(
        &self,
        buyer: &UserId,
        product_box_id: &ProductBoxId,
    ) -> Result<Option<AccessGrant>, DomainError> {
        let row: Option<GrantRow> = sqlx::query_as(
            "SELECT * FROM access_grants WHERE buyer_uid = $1 AND product_box_id = $2",
        )
        .bind(buyer.as_str())
        .bind(product_box_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find access grant", e))?;

        row.map(AccessGrant::try_from).transpose()
    }

    async fn has_access(
        &self,
        buyer: &UserId,
        product_box_id: &ProductBoxId,
    ) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM access_grants g
                JOIN purchases p ON p.id = g.purchase_id
                WHERE g.buyer_uid = $1
                  AND g.product_box_id = $2
                  AND p.status = 'completed'
            )
            "#,
        )
        .bind(buyer.as_str())
        .bind(product_box_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to check access", e))
    }

    async fn mark_refunded(&self, id: &PurchaseId, now: Timestamp) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE purchases SET status = 'refunded', refunded_at = $2
            WHERE id = $1 AND status = 'completed'
            "#,
        )
        .bind(id.as_str())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to refund purchase", e))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let status: Option<String> = sqlx::query_scalar("SELECT status FROM purchases WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to read purchase status", e))?;

        match status.as_deref() {
            None => Err(DomainError::not_found("purchase", id)),
            Some("refunded") => Ok(false),
            Some(other) => Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot refund a purchase in state {}", other),
            )),
        }
    }

    async fn backfill_missing_grants(&self) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO access_grants (buyer_uid, product_box_id, purchase_id, granted_at)
            SELECT DISTINCT ON (p.buyer_uid, p.product_box_id)
                   p.buyer_uid, p.product_box_id, p.id, p.purchased_at
            FROM purchases p
            WHERE p.status = 'completed'
              AND NOT EXISTS (
                  SELECT 1 FROM access_grants g
                  WHERE g.buyer_uid = p.buyer_uid AND g.product_box_id = p.product_box_id
              )
            ORDER BY p.buyer_uid, p.product_box_id, p.purchased_at
            ON CONFLICT (buyer_uid, product_box_id) DO NOTHING
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to backfill access grants", e))?;

        Ok(result.rows_affected())
    }
}
