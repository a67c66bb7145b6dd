//! BackfillAccessGrantsHandler - repairs purchases that lack a grant.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::ports::EntitlementStore;

pub struct BackfillAccessGrantsHandler {
    store: Arc<dyn EntitlementStore>,
}

impl BackfillAccessGrantsHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Returns how many grants were created.
    pub async fn handle(&self) -> Result<u64, DomainError> {
        let created = self.store.backfill_missing_grants().await?;
        tracing::info!(created, "Access grant backfill finished");
        Ok(created)
    }
}
