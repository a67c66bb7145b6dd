//! ConnectedAccountStore port - cached creator payment accounts.

use async_trait::async_trait;

use crate::domain::foundation::{CreatorId, DomainError};
use crate::domain::purchase::ConnectedAccount;

#[async_trait]
pub trait ConnectedAccountStore: Send + Sync {
    async fn find(&self, creator_id: &CreatorId) -> Result<Option<ConnectedAccount>, DomainError>;

    async fn find_by_account_id(
        &self,
        account_id: &str,
    ) -> Result<Option<ConnectedAccount>, DomainError>;

    /// Inserts or overwrites the cached state for the creator.
    async fn upsert(&self, account: &ConnectedAccount) -> Result<(), DomainError>;
}
