//! Mapping from provider subscription state to membership state.

use serde::{Deserialize, Serialize};

use super::{MembershipPlan, MembershipStatus};

/// Stripe subscription status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Unpaid,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Paused,
    #[serde(other)]
    Unknown,
}

/// Target membership state for a provider subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingOutcome {
    /// Upgrade (or stay) on creator_pro with this status.
    CreatorPro(MembershipStatus),
    /// Downgrade to free, leaving this status.
    Free(MembershipStatus),
}

impl BillingOutcome {
    pub fn plan(&self) -> MembershipPlan {
        match self {
            BillingOutcome::CreatorPro(_) => MembershipPlan::CreatorPro,
            BillingOutcome::Free(_) => MembershipPlan::Free,
        }
    }

    pub fn status(&self) -> MembershipStatus {
        match self {
            BillingOutcome::CreatorPro(s) | BillingOutcome::Free(s) => *s,
        }
    }
}

impl SubscriptionStatus {
    /// Maps provider status onto plan and status.
    ///
    /// | Stripe status | Plan | Status |
    /// |---------------|------|--------|
    /// | active, trialing | creator_pro | active |
    /// | past_due, unpaid | creator_pro | past_due |
    /// | canceled, incomplete_expired | free | canceled |
    /// | incomplete, paused, unknown | free | inactive |
    pub fn billing_outcome(&self) -> BillingOutcome {
        match self {
            SubscriptionStatus::Active | SubscriptionStatus::Trialing => {
                BillingOutcome::CreatorPro(MembershipStatus::Active)
            }
            SubscriptionStatus::PastDue | SubscriptionStatus::Unpaid => {
                BillingOutcome::CreatorPro(MembershipStatus::PastDue)
            }
            SubscriptionStatus::Canceled | SubscriptionStatus::IncompleteExpired => {
                BillingOutcome::Free(MembershipStatus::Canceled)
            }
            SubscriptionStatus::Incomplete
            | SubscriptionStatus::Paused
            | SubscriptionStatus::Unknown => BillingOutcome::Free(MembershipStatus::Inactive),
        }
    }
}
