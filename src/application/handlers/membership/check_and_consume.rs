//! CheckAndConsumeHandler - the usage limiter.
//!
//! Free members get a fixed number of downloads per calendar month and a
//! lifetime number of bundles. creator_pro members are unlimited. The
//! cap check and the increment are one atomic store operation.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::membership::{ConsumeOutcome, FreeTierLimits, UsageCounter};
use crate::ports::MembershipStore;

/// Command to consume one unit of a usage counter.
#[derive(Debug, Clone)]
pub struct CheckAndConsumeCommand {
    pub uid: UserId,
    pub counter: UsageCounter,
}

/// Handler enforcing free-tier quotas.
pub struct CheckAndConsumeHandler {
    store: Arc<dyn MembershipStore>,
    limits: FreeTierLimits,
}

impl CheckAndConsumeHandler {
    pub fn new(store: Arc<dyn MembershipStore>, limits: FreeTierLimits) -> Self {
        Self { store, limits }
    }

    pub async fn handle(&self, cmd: CheckAndConsumeCommand) -> Result<ConsumeOutcome, DomainError> {
        let now = Timestamp::now();

        let snapshot = match self
            .store
            .consume(&cmd.uid, cmd.counter, 1, &self.limits, now)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) if e.code == ErrorCode::NotFound => {
                // First activity for this user: create the default record and retry once.
                self.store.ensure(&cmd.uid, None, now).await?;
                self.store
                    .consume(&cmd.uid, cmd.counter, 1, &self.limits, now)
                    .await?
            }
            Err(e) => return Err(e),
        };

        let outcome = ConsumeOutcome::from_snapshot(&snapshot, cmd.counter, &self.limits);
        if !outcome.allowed {
            tracing::info!(
                uid = %cmd.uid,
                counter = cmd.counter.as_str(),
                value = snapshot.value,
                "Usage limit reached"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryMembershipStore;
    use crate::domain::membership::{CreatorProLink, MembershipStatus, Remaining};

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn handler(store: Arc<InMemoryMembershipStore>) -> CheckAndConsumeHandler {
        CheckAndConsumeHandler::new(store, FreeTierLimits::default())
    }

    fn consume(who: &str, counter: UsageCounter) -> CheckAndConsumeCommand {
        CheckAndConsumeCommand {
            uid: uid(who),
            counter,
        }
    }

    #[tokio::test]
    async fn free_member_gets_five_downloads_then_denied() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let handler = handler(store);

        for expected_remaining in (0..5).rev() {
            let outcome = handler
                .handle(consume("alice", UsageCounter::Downloads))
                .await
                .unwrap();
            assert!(outcome.allowed);
            assert_eq!(outcome.remaining, Remaining::Limited(expected_remaining));
        }

        let denied = handler
            .handle(consume("alice", UsageCounter::Downloads))
            .await
            .unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, Remaining::Limited(0));
    }

    #[tokio::test]
    async fn bundles_have_their_own_cap() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let handler = handler(store);

        for _ in 0..3 {
            assert!(handler.handle(consume("alice", UsageCounter::Bundles)).await.unwrap().allowed);
        }
        assert!(!handler.handle(consume("alice", UsageCounter::Bundles)).await.unwrap().allowed);
        assert!(handler.handle(consume("alice", UsageCounter::Downloads)).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn creator_pro_is_unlimited() {
        let store = Arc::new(InMemoryMembershipStore::new());
        let link =
            CreatorProLink::new("cus_1", "sub_1", MembershipStatus::Active, None, false).unwrap();
        store
            .upgrade_to_creator_pro(&uid("pro"), &link, Timestamp::now())
            .await
            .unwrap();
        let handler = handler(store);

        for _ in 0..20 {
            let outcome = handler.handle(consume("pro", UsageCounter::Downloads)).await.unwrap();
            assert!(outcome.allowed);
            assert_eq!(outcome.remaining, Remaining::Unlimited);
        }
    }

    #[tokio::test]
    async fn concurrent_consumers_never_exceed_cap() {
        let store = Arc::new(InMemoryMembershipStore::new());
        store.ensure(&uid("alice"), None, Timestamp::now()).await.unwrap();
        let handler = Arc::new(handler(store.clone()));

        let tasks: Vec<_> = (0..25)
            .map(|_| {
                let handler = handler.clone();
                tokio::spawn(async move {
                    handler.handle(consume("alice", UsageCounter::Downloads)).await
                })
            })
            .collect();

        let mut allowed = 0;
        for task in tasks {
            if task.await.unwrap().unwrap().allowed {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 5);
        let record = store.find(&uid("alice")).await.unwrap().unwrap();
        assert_eq!(record.usage.downloads_this_period, 5);
    }
}
