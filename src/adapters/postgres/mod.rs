//! PostgreSQL adapters - Database implementations of the storage ports.
//!
//! - `PostgresMembershipStore` - membership records and usage counters
//! - `PostgresEntitlementStore` - purchases and access grants
//! - `PostgresConnectedAccountStore` - cached creator payment accounts
//! - `PostgresWebhookEventRepository` - the webhook event log
//!
//! Schema lives in `migrations/` and is applied with `sqlx::migrate!`.

mod connected_account_store;
mod entitlement_store;
mod membership_store;
mod webhook_event_repository;

pub use connected_account_store::PostgresConnectedAccountStore;
pub use entitlement_store::PostgresEntitlementStore;
pub use membership_store::PostgresMembershipStore;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};

/// Runs the embedded migrations against the pool.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to run migrations: {}", e)))
}

/// Maps a driver error onto the domain error space.
///
/// Unique violations are permanent, everything else is treated as a
/// transient storage failure.
pub(crate) fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return DomainError::new(
                ErrorCode::ValidationFailed,
                format!("{}: duplicate key", context),
            )
            .with_detail("constraint", constraint);
        }
    }
    DomainError::storage(format!("{}: {}", context, err))
}

/// Error for a row whose text columns don't parse back into domain types.
pub(crate) fn corrupt_row(table: &str, reason: impl std::fmt::Display) -> DomainError {
    DomainError::storage(format!("Corrupt {} row: {}", table, reason))
}

pub(crate) fn to_u32(table: &str, value: i32) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| corrupt_row(table, format!("negative counter {}", value)))
}

pub(crate) fn ts(dt: chrono::DateTime<chrono::Utc>) -> Timestamp {
    Timestamp::from_datetime(dt)
}
