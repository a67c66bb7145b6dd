//! Membership handlers.
//!
//! ## Commands
//! - Get-or-create the caller's membership
//! - Check and consume free-tier usage
//! - Start a creator_pro checkout, open the billing portal
//!
//! Subscription snapshots from Stripe are applied through
//! `apply_subscription`, shared with the webhook reconciler.

mod apply_subscription;
mod check_and_consume;
mod create_billing_portal;
mod create_subscription_checkout;
mod ensure_membership;

pub use apply_subscription::{apply_subscription, downgrade, resolve_subscriber, SubscriptionApplied};
pub use check_and_consume::{CheckAndConsumeCommand, CheckAndConsumeHandler};
pub use create_billing_portal::{CreateBillingPortalCommand, CreateBillingPortalHandler};
pub use create_subscription_checkout::{
    CreateSubscriptionCheckoutCommand, CreateSubscriptionCheckoutHandler,
    SubscriptionCheckoutSettings,
};
pub use ensure_membership::{EnsureMembershipCommand, EnsureMembershipHandler};
