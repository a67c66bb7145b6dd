//! Membership module - plan, status, usage counters and the per-user record.
//!
//! # Module Structure
//!
//! - `plan` - free vs. creator_pro
//! - `status` - membership status values
//! - `subscription` - mapping from Stripe subscription status
//! - `usage` - usage counters, free-tier limits, consume outcomes
//! - `record` - the membership record and its invariants

mod plan;
mod record;
mod status;
mod subscription;
mod usage;

pub use plan::MembershipPlan;
pub use record::{CreatorProLink, MembershipRecord};
pub use status::MembershipStatus;
pub use subscription::{BillingOutcome, SubscriptionStatus};
pub use usage::{
    ConsumeOutcome, FreeTierLimits, Remaining, UsageCounter, UsageCounters, UsageSnapshot,
};
