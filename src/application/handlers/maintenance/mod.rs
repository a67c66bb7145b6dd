//! Operator maintenance handlers.
//!
//! Callable only by uids listed in `auth.admin_uids`.

mod backfill_access_grants;
mod membership_report;
mod prune_webhook_events;
mod refund_purchase;
mod resync_membership;

pub use backfill_access_grants::BackfillAccessGrantsHandler;
pub use membership_report::{MembershipReport, MembershipReportHandler};
pub use prune_webhook_events::{PruneWebhookEventsHandler, MIN_RETENTION_DAYS};
pub use refund_purchase::RefundPurchaseHandler;
pub use resync_membership::{ResyncMembershipHandler, ResyncMembershipResult};
