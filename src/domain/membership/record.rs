//! Membership record entity.
//!
//! One record per user, keyed by Firebase uid. Records are created lazily
//! with free defaults and are never deleted; losing a subscription only
//! downgrades the record back to free.
//!
//! # Invariants
//!
//! - `status == Active` implies `plan == CreatorPro`
//! - a free member has no `stripe_subscription_id`

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};

use super::{MembershipPlan, MembershipStatus, UsageCounters};

/// Per-user billing and usage state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    pub uid: UserId,
    pub email: Option<String>,
    pub plan: MembershipPlan,
    pub status: MembershipStatus,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    pub usage: UsageCounters,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Billing fields written when a member is on `creator_pro`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorProLink {
    pub customer_id: String,
    pub subscription_id: String,
    pub status: MembershipStatus,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
}

impl CreatorProLink {
    /// Creates a link, rejecting statuses that don't belong to a paid plan.
    pub fn new(
        customer_id: impl Into<String>,
        subscription_id: impl Into<String>,
        status: MembershipStatus,
        current_period_end: Option<Timestamp>,
        cancel_at_period_end: bool,
    ) -> Result<Self, DomainError> {
        if !matches!(status, MembershipStatus::Active | MembershipStatus::PastDue) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("creator_pro cannot be {}", status),
            ));
        }
        let customer_id = customer_id.into();
        let subscription_id = subscription_id.into();
        if customer_id.is_empty() || subscription_id.is_empty() {
            return Err(DomainError::validation(
                "subscription",
                "creator_pro requires customer and subscription ids",
            ));
        }
        Ok(Self {
            customer_id,
            subscription_id,
            status,
            current_period_end,
            cancel_at_period_end,
        })
    }
}

impl MembershipRecord {
    /// Default record for a user seen for the first time.
    pub fn new_free(uid: UserId, email: Option<String>, now: Timestamp) -> Self {
        Self {
            uid,
            email,
            plan: MembershipPlan::Free,
            status: MembershipStatus::Inactive,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            current_period_end: None,
            cancel_at_period_end: false,
            usage: UsageCounters::empty(now.start_of_month()),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_creator_pro(&self) -> bool {
        self.plan == MembershipPlan::CreatorPro
    }

    /// Overwrites billing state with a paid subscription.
    ///
    /// Returns true if anything changed. `updated_at` only moves on change,
    /// so replaying the same link leaves the record untouched.
    pub fn apply_creator_pro(&mut self, link: &CreatorProLink, now: Timestamp) -> bool {
        let before = self.clone();
        self.plan = MembershipPlan::CreatorPro;
        self.status = link.status;
        self.stripe_customer_id = Some(link.customer_id.clone());
        self.stripe_subscription_id = Some(link.subscription_id.clone());
        self.current_period_end = link.current_period_end;
        self.cancel_at_period_end = link.cancel_at_period_end;
        self.touch_if_changed(&before, now)
    }

    /// Moves the member back to free.
    ///
    /// Already-free members are left as they are. The customer id is kept
    /// so a later resubscription can be matched to this user.
    pub fn apply_downgrade(
        &mut self,
        status: MembershipStatus,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        if status == MembershipStatus::Active {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "free members cannot be active",
            ));
        }
        if self.plan == MembershipPlan::Free {
            return Ok(false);
        }
        let before = self.clone();
        self.plan = MembershipPlan::Free;
        self.status = status;
        self.stripe_subscription_id = None;
        self.current_period_end = None;
        self.cancel_at_period_end = false;
        Ok(self.touch_if_changed(&before, now))
    }

    /// Flags a failed renewal. Only paid members can be past due.
    pub fn mark_past_due(&mut self, now: Timestamp) -> bool {
        if self.plan != MembershipPlan::CreatorPro || self.status == MembershipStatus::PastDue {
            return false;
        }
        self.status = MembershipStatus::PastDue;
        self.updated_at = now;
        true
    }

    /// Describes every invariant this record breaks. Empty when healthy.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.status == MembershipStatus::Active && self.plan != MembershipPlan::CreatorPro {
            violations.push(format!("status is active but plan is {}", self.plan));
        }
        if self.plan == MembershipPlan::Free && self.stripe_subscription_id.is_some() {
            violations.push("free member still has a subscription id".to_string());
        }
        if self.plan == MembershipPlan::CreatorPro && self.stripe_subscription_id.is_none() {
            violations.push("creator_pro member has no subscription id".to_string());
        }
        violations
    }

    fn touch_if_changed(&mut self, before: &Self, now: Timestamp) -> bool {
        if self == before {
            return false;
        }
        self.updated_at = now;
        true
    }
}
