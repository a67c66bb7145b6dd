//! PostgreSQL implementation of MembershipStore.
//!
//! Every mutation is a single SQL statement. Usage caps are enforced in
//! the `WHERE` clause of the increment so concurrent requests cannot
//! overshoot a free member's quota.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{corrupt_row, db_error, to_u32, ts};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::membership::{
    CreatorProLink, FreeTierLimits, MembershipPlan, MembershipRecord, MembershipStatus,
    UsageCounter, UsageCounters, UsageSnapshot,
};
use crate::ports::MembershipStore;

/// PostgreSQL implementation of the MembershipStore port.
#[derive(Clone)]
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, uid: &UserId) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM memberships WHERE uid = $1)")
            .bind(uid.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to check membership", e))
    }
}

/// Database row representation of a membership.
#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    uid: String,
    email: Option<String>,
    plan: String,
    status: String,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    downloads_this_period: i32,
    bundles_created: i32,
    usage_period_start: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for MembershipRecord {
    type Error = DomainError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(MembershipRecord {
            uid: UserId::new(row.uid).map_err(|e| corrupt_row("memberships", e))?,
            email: row.email,
            plan: row
                .plan
                .parse::<MembershipPlan>()
                .map_err(|e| corrupt_row("memberships", e))?,
            status: row
                .status
                .parse::<MembershipStatus>()
                .map_err(|e| corrupt_row("memberships", e))?,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            current_period_end: row.current_period_end.map(ts),
            cancel_at_period_end: row.cancel_at_period_end,
            usage: UsageCounters {
                downloads_this_period: to_u32("memberships", row.downloads_this_period)?,
                bundles_created: to_u32("memberships", row.bundles_created)?,
                period_start: ts(row.usage_period_start),
            },
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CounterRow {
    plan: String,
    value: i32,
}

impl CounterRow {
    fn into_snapshot(self, consumed: bool) -> Result<UsageSnapshot, DomainError> {
        Ok(UsageSnapshot {
            plan: self
                .plan
                .parse::<MembershipPlan>()
                .map_err(|e| corrupt_row("memberships", e))?,
            value: to_u32("memberships", self.value)?,
            consumed,
        })
    }
}

fn amount_param(amount: u32) -> Result<i32, DomainError> {
    i32::try_from(amount).map_err(|_| DomainError::validation("amount", "usage amount too large"))
}

// Downloads roll over to zero when the stored period predates $2.
const INCREMENT_DOWNLOADS: &str = r#"
    UPDATE memberships SET
        downloads_this_period =
            (CASE WHEN usage_period_start < $2 THEN 0 ELSE downloads_this_period END) + $3,
        usage_period_start = GREATEST(usage_period_start, $2),
        updated_at = $4
    WHERE uid = $1
      AND (
          $5::INTEGER IS NULL
          OR plan = 'creator_pro'
          OR (CASE WHEN usage_period_start < $2 THEN 0 ELSE downloads_this_period END) + $3 <= $5
      )
    RETURNING plan, downloads_this_period AS value
"#;

const INCREMENT_BUNDLES: &str = r#"
    UPDATE memberships SET
        bundles_created = bundles_created + $3,
        downloads_this_period =
            CASE WHEN usage_period_start < $2 THEN 0 ELSE downloads_this_period END,
        usage_period_start = GREATEST(usage_period_start, $2),
        updated_at = $4
    WHERE uid = $1
      AND ($5::INTEGER IS NULL OR plan = 'creator_pro' OR bundles_created + $3 <= $5)
    RETURNING plan, bundles_created AS value
"#;

const CURRENT_DOWNLOADS: &str = r#"
    SELECT plan,
           CASE WHEN usage_period_start < $2 THEN 0 ELSE downloads_this_period END AS value
    FROM memberships WHERE uid = $1
"#;

const CURRENT_BUNDLES: &str = r#"
    SELECT plan, bundles_created AS value FROM memberships WHERE uid = $1
"#;

impl PostgresMembershipStore {
    /// Conditional increment shared by `increment_usage` and `consume`.
    ///
    /// `cap = None` removes the free-tier check entirely.
    async fn increment(
        &self,
        uid: &UserId,
        counter: UsageCounter,
        amount: u32,
        cap: Option<u32>,
        now: Timestamp,
    ) -> Result<Option<CounterRow>, DomainError> {
        let sql = match counter {
            UsageCounter::Downloads => INCREMENT_DOWNLOADS,
            UsageCounter::Bundles => INCREMENT_BUNDLES,
        };
        let cap = cap.map(|c| i32::try_from(c).unwrap_or(i32::MAX));

        sqlx::query_as::<_, CounterRow>(sql)
            .bind(uid.as_str())
            .bind(*now.start_of_month().as_datetime())
            .bind(amount_param(amount)?)
            .bind(now.as_datetime())
            .bind(cap)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update usage", e))
    }
}

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    async fn ensure(
        &self,
        uid: &UserId,
        email: Option<&str>,
        now: Timestamp,
    ) -> Result<MembershipRecord, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO memberships (
                uid, email, plan, status, usage_period_start, created_at, updated_at
            ) VALUES ($1, $2, 'free', 'inactive', $3, $4, $4)
            ON CONFLICT (uid) DO NOTHING
            "#,
        )
        .bind(uid.as_str())
        .bind(email)
        .bind(*now.start_of_month().as_datetime())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create membership", e))?;

        let row: MembershipRow = sqlx::query_as("SELECT * FROM memberships WHERE uid = $1")
            .bind(uid.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load membership", e))?;

        row.try_into()
    }

    async fn find(&self, uid: &UserId) -> Result<Option<MembershipRecord>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as("SELECT * FROM memberships WHERE uid = $1")
            .bind(uid.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find membership", e))?;

        row.map(MembershipRecord::try_from).transpose()
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<MembershipRecord>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT * FROM memberships
            WHERE stripe_customer_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find membership by customer", e))?;

        row.map(MembershipRecord::try_from).transpose()
    }

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<MembershipRecord>, DomainError> {
        let row: Option<MembershipRow> =
            sqlx::query_as("SELECT * FROM memberships WHERE stripe_subscription_id = $1")
                .bind(subscription_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find membership by subscription", e))?;

        row.map(MembershipRecord::try_from).transpose()
    }

    async fn increment_usage(
        &self,
        uid: &UserId,
        counter: UsageCounter,
        amount: u32,
        now: Timestamp,
    ) -> Result<u32, DomainError> {
        let row = self
            .increment(uid, counter, amount, None, now)
            .await?
            .ok_or_else(|| DomainError::not_found("membership", uid))?;
        to_u32("memberships", row.value)
    }

    async fn consume(
        &self,
        uid: &UserId,
        counter: UsageCounter,
        amount: u32,
        limits: &FreeTierLimits,
        now: Timestamp,
    ) -> Result<UsageSnapshot, DomainError> {
        let cap = Some(limits.cap_for(counter));
        if let Some(row) = self.increment(uid, counter, amount, cap, now).await? {
            return row.into_snapshot(true);
        }

        // Nothing updated: either the cap was hit or the record is missing.
        let query = match counter {
            UsageCounter::Downloads => sqlx::query_as::<_, CounterRow>(CURRENT_DOWNLOADS)
                .bind(uid.as_str())
                .bind(*now.start_of_month().as_datetime()),
            UsageCounter::Bundles => {
                sqlx::query_as::<_, CounterRow>(CURRENT_BUNDLES).bind(uid.as_str())
            }
        };
        let current = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to read usage", e))?;

        current
            .ok_or_else(|| DomainError::not_found("membership", uid))?
            .into_snapshot(false)
    }

    async fn downgrade_to_free(
        &self,
        uid: &UserId,
        subscription_id: &str,
        status: MembershipStatus,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        if status == MembershipStatus::Active {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "free members cannot be active",
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE memberships SET
                plan = 'free',
                status = $2,
                stripe_subscription_id = NULL,
                current_period_end = NULL,
                cancel_at_period_end = FALSE,
                updated_at = $3
            WHERE uid = $1
              AND plan <> 'free'
              AND (stripe_subscription_id IS NULL OR stripe_subscription_id = $4)
            "#,
        )
        .bind(uid.as_str())
        .bind(status.as_str())
        .bind(now.as_datetime())
        .bind(subscription_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to downgrade membership", e))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        if self.exists(uid).await? {
            Ok(false)
        } else {
            Err(DomainError::not_found("membership", uid))
        }
    }

    async fn upgrade_to_creator_pro(
        &self,
        uid: &UserId,
        link: &CreatorProLink,
        now: Timestamp,
    ) -> Result<MembershipRecord, DomainError> {
        let row: MembershipRow = sqlx::query_as(
            r#"
            INSERT INTO memberships (
                uid, plan, status, stripe_customer_id, stripe_subscription_id,
                current_period_end, cancel_at_period_end, usage_period_start,
                created_at, updated_at
            ) VALUES ($1, 'creator_pro', $2, $3, $4, $5, $6, $7, $8, $8)
            ON CONFLICT (uid) DO UPDATE SET
                plan = EXCLUDED.plan,
                status = EXCLUDED.status,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                current_period_end = EXCLUDED.current_period_end,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                updated_at = CASE
                    WHEN (memberships.plan, memberships.status, memberships.stripe_customer_id,
                          memberships.stripe_subscription_id, memberships.current_period_end,
                          memberships.cancel_at_period_end)
                         IS DISTINCT FROM
                         (EXCLUDED.plan, EXCLUDED.status, EXCLUDED.stripe_customer_id,
                          EXCLUDED.stripe_subscription_id, EXCLUDED.current_period_end,
                          EXCLUDED.cancel_at_period_end)
                    THEN EXCLUDED.updated_at
                    ELSE memberships.updated_at
                END
            RETURNING *
            "#,
        )
        .bind(uid.as_str())
        .bind(link.status.as_str())
        .bind(&link.customer_id)
        .bind(&link.subscription_id)
        .bind(link.current_period_end.map(|t| *t.as_datetime()))
        .bind(link.cancel_at_period_end)
        .bind(*now.start_of_month().as_datetime())
        .bind(now.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to upgrade membership", e))?;

        row.try_into()
    }

    async fn mark_past_due(&self, uid: &UserId, now: Timestamp) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE memberships SET status = 'past_due', updated_at = $2
            WHERE uid = $1 AND plan = 'creator_pro' AND status <> 'past_due'
            "#,
        )
        .bind(uid.as_str())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark membership past due", e))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        if self.exists(uid).await? {
            Ok(false)
        } else {
            Err(DomainError::not_found("membership", uid))
        }
    }

    async fn list_with_subscription(&self, limit: u32) -> Result<Vec<MembershipRecord>, DomainError> {
        let rows: Vec<MembershipRow> = sqlx::query_as(
            r#"
            SELECT * FROM memberships
            WHERE stripe_subscription_id IS NOT NULL
            ORDER BY uid
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list memberships", e))?;

        rows.into_iter().map(MembershipRecord::try_from).collect()
    }
}
