//! CreateBillingPortalHandler - opens the Stripe billing portal.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{MembershipStore, PaymentProvider, PortalSession};

#[derive(Debug, Clone)]
pub struct CreateBillingPortalCommand {
    pub uid: UserId,
}

/// Handler for billing portal sessions.
///
/// Only members that already have a Stripe customer can manage billing.
pub struct CreateBillingPortalHandler {
    store: Arc<dyn MembershipStore>,
    payment_provider: Arc<dyn PaymentProvider>,
    return_url: String,
}

impl CreateBillingPortalHandler {
    pub fn new(
        store: Arc<dyn MembershipStore>,
        payment_provider: Arc<dyn PaymentProvider>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            payment_provider,
            return_url: return_url.into(),
        }
    }

    pub async fn handle(&self, cmd: CreateBillingPortalCommand) -> Result<PortalSession, DomainError> {
        let customer_id = self
            .store
            .find(&cmd.uid)
            .await?
            .and_then(|record| record.stripe_customer_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    "No billing account for this member",
                )
            })?;

        Ok(self
            .payment_provider
            .create_portal_session(&customer_id, &self.return_url)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMembershipStore;
    use crate::adapters::stripe::MockPaymentProvider;
    use crate::domain::foundation::Timestamp;
    use crate::domain::membership::{CreatorProLink, MembershipStatus};

    #[tokio::test]
    async fn opens_portal_for_linked_customer() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let uid = UserId::new("alice").unwrap();
        let link =
            CreatorProLink::new("cus_1", "sub_1", MembershipStatus::Active, None, false).unwrap();
        store.upgrade_to_creator_pro(&uid, &link, Timestamp::now()).await.unwrap();
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = CreateBillingPortalHandler::new(store, provider.clone(), "https://app.test/account");

        let session = handler.handle(CreateBillingPortalCommand { uid }).await.unwrap();

        assert!(session.url.contains(&session.id));
        assert_eq!(
            provider.calls()[0].args,
            vec!["cus_1".to_string(), "https://app.test/account".to_string()]
        );
    }

    #[tokio::test]
    async fn member_without_customer_is_rejected() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let uid = UserId::new("alice").unwrap();
        store.ensure(&uid, None, Timestamp::now()).await.unwrap();
        let handler =
            CreateBillingPortalHandler::new(store, Arc::new(MockPaymentProvider::new()), "https://app.test");

        let err = handler.handle(CreateBillingPortalCommand { uid }).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }
}
