//! MembershipStore port - per-user membership records.
//!
//! Every mutation is a single atomic operation on one record. Adapters
//! must not implement any method as a separate read followed by a write.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::membership::{
    CreatorProLink, FreeTierLimits, MembershipRecord, MembershipStatus, UsageCounter,
    UsageSnapshot,
};

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Returns the record for `uid`, creating a free default if absent.
    ///
    /// Creation is insert-if-absent: concurrent first calls yield one record.
    async fn ensure(
        &self,
        uid: &UserId,
        email: Option<&str>,
        now: Timestamp,
    ) -> Result<MembershipRecord, DomainError>;

    async fn find(&self, uid: &UserId) -> Result<Option<MembershipRecord>, DomainError>;

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<MembershipRecord>, DomainError>;

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<MembershipRecord>, DomainError>;

    /// Adds `amount` to a counter without a cap. Returns the new value.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no record.
    async fn increment_usage(
        &self,
        uid: &UserId,
        counter: UsageCounter,
        amount: u32,
        now: Timestamp,
    ) -> Result<u32, DomainError>;

    /// Adds `amount` to a counter if the member's plan allows it.
    ///
    /// The plan check, period rollover and increment happen in one atomic
    /// step, so concurrent calls can never push a free member past the cap.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no record.
    async fn consume(
        &self,
        uid: &UserId,
        counter: UsageCounter,
        amount: u32,
        limits: &FreeTierLimits,
        now: Timestamp,
    ) -> Result<UsageSnapshot, DomainError>;

    /// Moves the member to free with the given non-active status.
    ///
    /// Applies only while the record links `subscription_id` or no
    /// subscription at all, checked in the same write. Returns false when
    /// the member was already free or has moved to another subscription.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no record.
    async fn downgrade_to_free(
        &self,
        uid: &UserId,
        subscription_id: &str,
        status: MembershipStatus,
        now: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Writes creator_pro billing state, creating the record if needed.
    async fn upgrade_to_creator_pro(
        &self,
        uid: &UserId,
        link: &CreatorProLink,
        now: Timestamp,
    ) -> Result<MembershipRecord, DomainError>;

    /// Flags a paid member as past due. Returns false if nothing changed.
    async fn mark_past_due(&self, uid: &UserId, now: Timestamp) -> Result<bool, DomainError>;

    /// Members that carry a subscription id, for resync jobs.
    async fn list_with_subscription(&self, limit: u32) -> Result<Vec<MembershipRecord>, DomainError>;
}
