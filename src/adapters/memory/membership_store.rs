//! In-memory membership store for tests and local development.
//!
//! A single write lock around the map gives each operation the same
//! atomicity the Postgres adapter gets from single-statement updates.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::membership::{
    CreatorProLink, FreeTierLimits, MembershipRecord, MembershipStatus, UsageCounter,
    UsageSnapshot,
};
use crate::ports::MembershipStore;

#[derive(Debug, Default, Clone)]
pub struct InMemoryMembershipStore {
    records: Arc<RwLock<HashMap<UserId, MembershipRecord>>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record, replacing any existing one.
    pub async fn insert(&self, record: MembershipRecord) {
        self.records.write().await.insert(record.uid.clone(), record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn missing(uid: &UserId) -> DomainError {
    DomainError::not_found("membership", uid)
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn ensure(
        &self,
        uid: &UserId,
        email: Option<&str>,
        now: Timestamp,
    ) -> Result<MembershipRecord, DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .entry(uid.clone())
            .or_insert_with(|| MembershipRecord::new_free(uid.clone(), email.map(String::from), now));
        Ok(record.clone())
    }

    async fn find(&self, uid: &UserId) -> Result<Option<MembershipRecord>, DomainError> {
        Ok(self.records.read().await.get(uid).cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<MembershipRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<MembershipRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.stripe_subscription_id.as_deref() == Some(subscription_id))
            .cloned())
    }

    async fn increment_usage(
        &self,
        uid: &UserId,
        counter: UsageCounter,
        amount: u32,
        now: Timestamp,
    ) -> Result<u32, DomainError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(uid).ok_or_else(|| missing(uid))?;
        let value = record.usage.increment(counter, amount, now.start_of_month());
        record.updated_at = now;
        Ok(value)
    }

    async fn consume(
        &self,
        uid: &UserId,
        counter: UsageCounter,
        amount: u32,
        limits: &FreeTierLimits,
        now: Timestamp,
    ) -> Result<UsageSnapshot, DomainError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(uid).ok_or_else(|| missing(uid))?;

        let cap = limits.cap_for_plan(record.plan, counter);
        let consumed = record
            .usage
            .try_consume(counter, amount, cap, now.start_of_month());
        if consumed {
            record.updated_at = now;
        }

        Ok(UsageSnapshot {
            plan: record.plan,
            value: record.usage.value(counter),
            consumed,
        })
    }

    async fn downgrade_to_free(
        &self,
        uid: &UserId,
        subscription_id: &str,
        status: MembershipStatus,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(uid).ok_or_else(|| missing(uid))?;
        if record
            .stripe_subscription_id
            .as_deref()
            .is_some_and(|linked| linked != subscription_id)
        {
            return Ok(false);
        }
        record.apply_downgrade(status, now)
    }

    async fn upgrade_to_creator_pro(
        &self,
        uid: &UserId,
        link: &CreatorProLink,
        now: Timestamp,
    ) -> Result<MembershipRecord, DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .entry(uid.clone())
            .or_insert_with(|| MembershipRecord::new_free(uid.clone(), None, now));
        record.apply_creator_pro(link, now);
        Ok(record.clone())
    }

    async fn mark_past_due(&self, uid: &UserId, now: Timestamp) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(uid).ok_or_else(|| missing(uid))?;
        Ok(record.mark_past_due(now))
    }

    async fn list_with_subscription(&self, limit: u32) -> Result<Vec<MembershipRecord>, DomainError> {
        let records = self.records.read().await;
        let mut linked: Vec<_> = records
            .values()
            .filter(|r| r.stripe_subscription_id.is_some())
            .cloned()
            .collect();
        linked.sort_by(|a, b| a.uid.cmp(&b.uid));
        linked.truncate(limit as usize);
        Ok(linked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::membership::MembershipPlan;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn link() -> CreatorProLink {
        CreatorProLink::new("cus_1", "sub_1", MembershipStatus::Active, None, false).unwrap()
    }

    #[tokio::test]
    async fn ensure_creates_once() {
        let store = InMemoryMembershipStore::new();
        let first = store.ensure(&uid("alice"), Some("a@x.io"), Timestamp::now()).await.unwrap();
        let second = store.ensure(&uid("alice"), Some("other@x.io"), Timestamp::now()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.email.as_deref(), Some("a@x.io"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_ensure_yields_one_default_record() {
        let store = InMemoryMembershipStore::new();
        let now = Timestamp::now();
        let dana = uid("dana");
        let (a, b) = tokio::join!(store.ensure(&dana, None, now), store.ensure(&dana, None, now));

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.len().await, 1);
        let record = store.find(&dana).await.unwrap().unwrap();
        assert_eq!(record.plan, MembershipPlan::Free);
        assert_eq!(record.usage.downloads_this_period, 0);
    }

    #[tokio::test]
    async fn increment_without_record_is_not_found() {
        let store = InMemoryMembershipStore::new();
        let err = store
            .increment_usage(&uid("ghost"), UsageCounter::Downloads, 1, Timestamp::now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn consume_respects_plan_cap() {
        let store = InMemoryMembershipStore::new();
        let limits = FreeTierLimits::default();
        let now = Timestamp::now();
        store.ensure(&uid("alice"), None, now).await.unwrap();

        for _ in 0..3 {
            assert!(store
                .consume(&uid("alice"), UsageCounter::Bundles, 1, &limits, now)
                .await
                .unwrap()
                .consumed);
        }
        let denied = store
            .consume(&uid("alice"), UsageCounter::Bundles, 1, &limits, now)
            .await
            .unwrap();
        assert!(!denied.consumed);
        assert_eq!(denied.value, 3);
    }

    #[tokio::test]
    async fn creator_pro_consume_is_uncapped() {
        let store = InMemoryMembershipStore::new();
        let now = Timestamp::now();
        store.upgrade_to_creator_pro(&uid("pro"), &link(), now).await.unwrap();

        for _ in 0..20 {
            let snap = store
                .consume(&uid("pro"), UsageCounter::Downloads, 1, &FreeTierLimits::default(), now)
                .await
                .unwrap();
            assert!(snap.consumed);
        }
    }

    #[tokio::test]
    async fn upgrade_creates_missing_record_and_downgrade_reverts() {
        let store = InMemoryMembershipStore::new();
        let now = Timestamp::now();
        let record = store.upgrade_to_creator_pro(&uid("erin"), &link(), now).await.unwrap();
        assert_eq!(record.plan, MembershipPlan::CreatorPro);

        assert!(store
            .downgrade_to_free(&uid("erin"), "sub_1", MembershipStatus::Canceled, now)
            .await
            .unwrap());
        assert!(!store
            .downgrade_to_free(&uid("erin"), "sub_1", MembershipStatus::Canceled, now)
            .await
            .unwrap());
        assert!(store.find_by_subscription_id("sub_1").await.unwrap().is_none());
        assert!(store.find_by_customer_id("cus_1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn downgrade_for_a_replaced_subscription_keeps_the_newer_link() {
        let store = InMemoryMembershipStore::new();
        let now = Timestamp::now();
        let frank = uid("frank");
        let newer =
            CreatorProLink::new("cus_1", "sub_2", MembershipStatus::Active, None, false).unwrap();
        store.upgrade_to_creator_pro(&frank, &newer, now).await.unwrap();

        let changed = store
            .downgrade_to_free(&frank, "sub_1", MembershipStatus::Canceled, now)
            .await
            .unwrap();

        assert!(!changed);
        let record = store.find(&frank).await.unwrap().unwrap();
        assert_eq!(record.plan, MembershipPlan::CreatorPro);
        assert_eq!(record.stripe_subscription_id.as_deref(), Some("sub_2"));
    }
}
