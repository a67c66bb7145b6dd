//! CheckAccessHandler - Query handler for bundle access.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ProductBoxId, UserId};
use crate::ports::EntitlementStore;

#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub uid: UserId,
    pub product_box_id: ProductBoxId,
}

/// Whether the caller may open the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckAccessResult {
    pub has_access: bool,
    /// Purchase backing the grant, when one exists.
    pub purchase_id: Option<String>,
}

/// Handler for access checks.
///
/// A grant whose purchase was refunded no longer gives access.
pub struct CheckAccessHandler {
    store: Arc<dyn EntitlementStore>,
}

impl CheckAccessHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<CheckAccessResult, DomainError> {
        let has_access = self
            .store
            .has_access(&query.uid, &query.product_box_id)
            .await?;
        let purchase_id = if has_access {
            self.store
                .find_grant(&query.uid, &query.product_box_id)
                .await?
                .map(|grant| grant.purchase_id.into_inner())
        } else {
            None
        };

        Ok(CheckAccessResult {
            has_access,
            purchase_id,
        })
    }
}
