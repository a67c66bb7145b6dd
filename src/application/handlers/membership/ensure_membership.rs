//! EnsureMembershipHandler - get-or-create the caller's membership record.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::membership::MembershipRecord;
use crate::ports::MembershipStore;

/// Command to load (and lazily create) a membership.
#[derive(Debug, Clone)]
pub struct EnsureMembershipCommand {
    pub uid: UserId,
    /// Captured only when the record is created.
    pub email: Option<String>,
}

/// Handler for the get-or-create membership read.
///
/// First access creates a free record. Concurrent first calls still
/// yield a single record because the store inserts only if absent.
pub struct EnsureMembershipHandler {
    store: Arc<dyn MembershipStore>,
}

impl EnsureMembershipHandler {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, cmd: EnsureMembershipCommand) -> Result<MembershipRecord, DomainError> {
        self.store
            .ensure(&cmd.uid, cmd.email.as_deref(), Timestamp::now())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMembershipStore;
    use crate::domain::membership::{MembershipPlan, MembershipStatus};

    #[tokio::test]
    async fn creates_free_default_on_first_access() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let handler = EnsureMembershipHandler::new(store.clone());

        let record = handler
            .handle(EnsureMembershipCommand {
                uid: UserId::new("alice").unwrap(),
                email: Some("alice@example.com".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(record.plan, MembershipPlan::Free);
        assert_eq!(record.status, MembershipStatus::Inactive);
        assert_eq!(record.usage.downloads_this_period, 0);
        assert_eq!(record.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn second_call_keeps_original_email() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let handler = EnsureMembershipHandler::new(store.clone());
        let uid = UserId::new("alice").unwrap();

        handler
            .handle(EnsureMembershipCommand {
                uid: uid.clone(),
                email: Some("first@example.com".to_string()),
            })
            .await
            .unwrap();
        let record = handler
            .handle(EnsureMembershipCommand {
                uid,
                email: Some("second@example.com".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(record.email.as_deref(), Some("first@example.com"));
        assert_eq!(store.len().await, 1);
    }
}
