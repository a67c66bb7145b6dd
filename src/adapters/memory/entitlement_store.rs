//! In-memory entitlement store.
//!
//! Purchases and grants live behind one lock, so `record_purchase` commits
//! both or neither, like the Postgres transaction.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ProductBoxId, PurchaseId, Timestamp, UserId};
use crate::domain::purchase::{AccessGrant, PurchaseGrant, PurchaseRecord, PurchaseStatus};
use crate::ports::{EntitlementStore, SaveResult};

#[derive(Debug, Default)]
struct State {
    purchases: HashMap<PurchaseId, PurchaseRecord>,
    grants: HashMap<(UserId, ProductBoxId), AccessGrant>,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryEntitlementStore {
    state: Arc<RwLock<State>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a storage error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn purchase_count(&self) -> usize {
        self.state.read().await.purchases.len()
    }

    pub async fn grant_count(&self) -> usize {
        self.state.read().await.grants.len()
    }

    /// Inserts a purchase with no grant, reproducing records left behind
    /// by older write paths. Used to exercise grant backfill.
    pub async fn insert_orphan_purchase(&self, purchase: PurchaseRecord) {
        self.state
            .write()
            .await
            .purchases
            .insert(purchase.id.clone(), purchase);
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::storage("entitlement store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn record_purchase(&self, grant: &PurchaseGrant) -> Result<SaveResult, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;

        let purchase = grant.purchase();
        let result = if state.purchases.contains_key(&purchase.id) {
            SaveResult::AlreadyExists
        } else {
            state.purchases.insert(purchase.id.clone(), purchase.clone());
            SaveResult::Inserted
        };

        // A grant left pointing at a refunded purchase moves to the new one.
        let access = grant.grant();
        let key = (access.buyer_uid.clone(), access.product_box_id.clone());
        let grants_access = |id: &PurchaseId| {
            state
                .purchases
                .get(id)
                .is_some_and(|p| p.status.grants_access())
        };
        let replace = match state.grants.get(&key) {
            None => true,
            Some(existing) => {
                !grants_access(&existing.purchase_id) && grants_access(&access.purchase_id)
            }
        };
        if replace {
            state.grants.insert(key, access.clone());
        }

        Ok(result)
    }

    async fn find_purchase(&self, id: &PurchaseId) -> Result<Option<PurchaseRecord>, DomainError> {
        Ok(self.state.read().await.purchases.get(id).cloned())
    }

    async fn find_purchase_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PurchaseRecord>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .purchases
            .values()
            .find(|p| p.payment_intent_id.as_deref() == Some(payment_intent_id))
            .cloned())
    }

    async fn list_purchases(&self, buyer: &UserId) -> Result<Vec<PurchaseRecord>, DomainError> {
        let state = self.state.read().await;
        let mut purchases: Vec<_> = state
            .purchases
            .values()
            .filter(|p| &p.buyer_uid == buyer)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(purchases)
    }

    async fn find_grant(
        &self,
        buyer: &UserId,
        product_box_id: &ProductBoxId,
    ) -> Result<Option<AccessGrant>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .grants
            .get(&(buyer.clone(), product_box_id.clone()))
            .cloned())
    }

    async fn has_access(
        &self,
        buyer: &UserId,
        product_box_id: &ProductBoxId,
    ) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .get(&(buyer.clone(), product_box_id.clone()))
            .and_then(|grant| state.purchases.get(&grant.purchase_id))
            .is_some_and(|p| p.status.grants_access()))
    }

    async fn mark_refunded(&self, id: &PurchaseId, now: Timestamp) -> Result<bool, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let purchase = state
            .purchases
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("purchase", id))?;
        purchase.refund(now)
    }

    async fn backfill_missing_grants(&self) -> Result<u64, DomainError> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let missing: Vec<AccessGrant> = state
            .purchases
            .values()
            .filter(|p| p.status == PurchaseStatus::Completed)
            .filter(|p| {
                !state
                    .grants
                    .contains_key(&(p.buyer_uid.clone(), p.product_box_id.clone()))
            })
            .map(|p| AccessGrant {
                buyer_uid: p.buyer_uid.clone(),
                product_box_id: p.product_box_id.clone(),
                purchase_id: p.id.clone(),
                granted_at: p.purchased_at,
            })
            .collect();

        let mut created = 0;
        for grant in missing {
            let key = (grant.buyer_uid.clone(), grant.product_box_id.clone());
            if state.grants.insert(key, grant).is_none() {
                created += 1;
            }
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::EventId;
    use crate::domain::payment::{CheckoutCompleted, CheckoutMode, PaymentEvent, VerifiedEvent};

    fn paid_checkout(session_id: &str, payment_intent: &str) -> PurchaseGrant {
        let checkout = CheckoutCompleted {
            session_id: session_id.to_string(),
            mode: CheckoutMode::Payment,
            paid: true,
            buyer_uid: Some("bob".to_string()),
            product_box_id: Some("box_1".to_string()),
            creator_id: Some("carol".to_string()),
            amount_total: Some(2999),
            currency: Some("usd".to_string()),
            customer_id: None,
            subscription_id: None,
            payment_intent_id: Some(payment_intent.to_string()),
            customer_email: None,
        };
        let event = VerifiedEvent::new(
            EventId::new(format!("evt_{}", session_id)).unwrap(),
            "checkout.session.completed",
            Timestamp::now(),
            false,
            PaymentEvent::CheckoutCompleted(checkout),
            serde_json::json!({}),
        );
        PurchaseGrant::from_verified(&event).unwrap().unwrap()
    }

    fn bob() -> UserId {
        UserId::new("bob").unwrap()
    }

    fn box_1() -> ProductBoxId {
        ProductBoxId::new("box_1").unwrap()
    }

    #[tokio::test]
    async fn purchase_and_grant_are_written_together() {
        let store = InMemoryEntitlementStore::new();

        let result = store.record_purchase(&paid_checkout("cs_123", "pi_123")).await.unwrap();

        assert_eq!(result, SaveResult::Inserted);
        assert_eq!(store.purchase_count().await, 1);
        assert_eq!(store.grant_count().await, 1);
        assert!(store.has_access(&bob(), &box_1()).await.unwrap());
    }

    #[tokio::test]
    async fn repeated_write_keeps_one_purchase() {
        let store = InMemoryEntitlementStore::new();
        let grant = paid_checkout("cs_123", "pi_123");

        store.record_purchase(&grant).await.unwrap();
        let again = store.record_purchase(&grant).await.unwrap();

        assert_eq!(again, SaveResult::AlreadyExists);
        assert_eq!(store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn refund_revokes_access() {
        let store = InMemoryEntitlementStore::new();
        store.record_purchase(&paid_checkout("cs_123", "pi_123")).await.unwrap();

        assert!(store
            .mark_refunded(&PurchaseId::new("cs_123").unwrap(), Timestamp::now())
            .await
            .unwrap());

        assert!(!store.has_access(&bob(), &box_1()).await.unwrap());
    }

    #[tokio::test]
    async fn repurchase_after_refund_restores_access() {
        let store = InMemoryEntitlementStore::new();
        store.record_purchase(&paid_checkout("cs_123", "pi_123")).await.unwrap();
        store
            .mark_refunded(&PurchaseId::new("cs_123").unwrap(), Timestamp::now())
            .await
            .unwrap();

        store.record_purchase(&paid_checkout("cs_456", "pi_456")).await.unwrap();

        assert!(store.has_access(&bob(), &box_1()).await.unwrap());
        let grant = store.find_grant(&bob(), &box_1()).await.unwrap().unwrap();
        assert_eq!(grant.purchase_id.as_str(), "cs_456");
    }

    #[tokio::test]
    async fn redelivered_refunded_purchase_does_not_take_the_grant_back() {
        let store = InMemoryEntitlementStore::new();
        store.record_purchase(&paid_checkout("cs_123", "pi_123")).await.unwrap();
        store
            .mark_refunded(&PurchaseId::new("cs_123").unwrap(), Timestamp::now())
            .await
            .unwrap();
        store.record_purchase(&paid_checkout("cs_456", "pi_456")).await.unwrap();

        store.record_purchase(&paid_checkout("cs_123", "pi_123")).await.unwrap();

        let grant = store.find_grant(&bob(), &box_1()).await.unwrap().unwrap();
        assert_eq!(grant.purchase_id.as_str(), "cs_456");
        assert!(store.has_access(&bob(), &box_1()).await.unwrap());
    }
}
