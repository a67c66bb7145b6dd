//! EntitlementStore port - purchase records and access grants.
//!
//! Purchases and grants are written only through `record_purchase`, which
//! accepts a `PurchaseGrant`. That type can only be built from a
//! signature-verified webhook event.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ProductBoxId, PurchaseId, Timestamp, UserId};
use crate::domain::purchase::{AccessGrant, PurchaseGrant, PurchaseRecord};

/// Result of an insert-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Row was written.
    Inserted,
    /// A row with this key already existed; nothing was overwritten.
    AlreadyExists,
}

#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Writes the purchase and its grant in one transaction.
    ///
    /// Keyed by purchase id. If the purchase already exists, the grant is
    /// still ensured (repairing a half-written pair) and `AlreadyExists` is
    /// returned. Either both rows are committed or neither is.
    ///
    /// There is one grant per buyer and bundle. An existing grant whose
    /// purchase was refunded is moved to this purchase when it is completed.
    async fn record_purchase(&self, grant: &PurchaseGrant) -> Result<SaveResult, DomainError>;

    async fn find_purchase(&self, id: &PurchaseId) -> Result<Option<PurchaseRecord>, DomainError>;

    async fn find_purchase_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PurchaseRecord>, DomainError>;

    /// Purchases made by `buyer`, newest first.
    async fn list_purchases(&self, buyer: &UserId) -> Result<Vec<PurchaseRecord>, DomainError>;

    async fn find_grant(
        &self,
        buyer: &UserId,
        product_box_id: &ProductBoxId,
    ) -> Result<Option<AccessGrant>, DomainError>;

    /// True if a grant exists and the purchase it points at is completed.
    async fn has_access(
        &self,
        buyer: &UserId,
        product_box_id: &ProductBoxId,
    ) -> Result<bool, DomainError>;

    /// Marks a purchase refunded. Returns false if it already was.
    ///
    /// # Errors
    ///
    /// `NotFound` if the purchase doesn't exist.
    async fn mark_refunded(&self, id: &PurchaseId, now: Timestamp) -> Result<bool, DomainError>;

    /// Creates grants for completed purchases that lack one.
    ///
    /// Returns how many grants were created.
    async fn backfill_missing_grants(&self) -> Result<u64, DomainError>;
}
