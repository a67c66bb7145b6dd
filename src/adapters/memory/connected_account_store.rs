//! In-memory connected account cache.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{CreatorId, DomainError};
use crate::domain::purchase::ConnectedAccount;
use crate::ports::ConnectedAccountStore;

#[derive(Debug, Default, Clone)]
pub struct InMemoryConnectedAccountStore {
    accounts: Arc<RwLock<HashMap<CreatorId, ConnectedAccount>>>,
}

impl InMemoryConnectedAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectedAccountStore for InMemoryConnectedAccountStore {
    async fn find(&self, creator_id: &CreatorId) -> Result<Option<ConnectedAccount>, DomainError> {
        Ok(self.accounts.read().await.get(creator_id).cloned())
    }

    async fn find_by_account_id(
        &self,
        account_id: &str,
    ) -> Result<Option<ConnectedAccount>, DomainError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.account_id == account_id)
            .cloned())
    }

    async fn upsert(&self, account: &ConnectedAccount) -> Result<(), DomainError> {
        self.accounts
            .write()
            .await
            .insert(account.creator_id.clone(), account.clone());
        Ok(())
    }
}
