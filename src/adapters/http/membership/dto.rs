//! Data Transfer Objects for membership and usage endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::membership::{
    ConsumeOutcome, FreeTierLimits, MembershipPlan, MembershipRecord, MembershipStatus,
    UsageCounter,
};
use crate::ports::{CheckoutSession, PortalSession};

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// The caller's membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub uid: String,
    pub plan: MembershipPlan,
    pub status: MembershipStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    /// Whether a billing portal can be opened.
    pub has_billing_account: bool,
    pub usage: UsageResponse,
}

/// Counter values with the caps that apply to the member's plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub downloads_this_period: u32,
    /// `None` when unlimited.
    pub downloads_limit: Option<u32>,
    pub bundles_created: u32,
    pub bundles_limit: Option<u32>,
    pub period_start: Timestamp,
}

impl MembershipResponse {
    pub fn from_record(record: &MembershipRecord, limits: &FreeTierLimits) -> Self {
        Self {
            uid: record.uid.to_string(),
            plan: record.plan,
            status: record.status,
            current_period_end: record.current_period_end,
            cancel_at_period_end: record.cancel_at_period_end,
            has_billing_account: record.stripe_customer_id.is_some(),
            usage: UsageResponse {
                downloads_this_period: record.usage.downloads_this_period,
                downloads_limit: limits.cap_for_plan(record.plan, UsageCounter::Downloads),
                bundles_created: record.usage.bundles_created,
                bundles_limit: limits.cap_for_plan(record.plan, UsageCounter::Bundles),
                period_start: record.usage.period_start,
            },
        }
    }
}

/// Result of a consume call.
///
/// `remaining` is `null` and `unlimited` is true for creator_pro members.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeResponse {
    pub counter: UsageCounter,
    pub allowed: bool,
    pub remaining: Option<u32>,
    pub unlimited: bool,
}

impl ConsumeResponse {
    pub fn new(counter: UsageCounter, outcome: ConsumeOutcome) -> Self {
        let remaining = outcome.remaining.as_option();
        Self {
            counter,
            allowed: outcome.allowed,
            remaining,
            unlimited: remaining.is_none(),
        }
    }
}

/// Hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub checkout_url: String,
}

impl From<CheckoutSession> for CheckoutResponse {
    fn from(session: CheckoutSession) -> Self {
        Self {
            session_id: session.id,
            checkout_url: session.url,
        }
    }
}

/// Billing portal session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalResponse {
    pub portal_url: String,
}

impl From<PortalSession> for PortalResponse {
    fn from(session: PortalSession) -> Self {
        Self {
            portal_url: session.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::membership::Remaining;

    #[test]
    fn free_member_sees_caps() {
        let record = MembershipRecord::new_free(UserId::new("alice").unwrap(), None, Timestamp::now());
        let response = MembershipResponse::from_record(&record, &FreeTierLimits::default());

        assert_eq!(response.usage.downloads_limit, Some(5));
        assert_eq!(response.usage.bundles_limit, Some(3));
        assert!(!response.has_billing_account);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["plan"], "free");
        assert_eq!(json["usage"]["downloadsThisPeriod"], 0);
        assert!(json.get("currentPeriodEnd").is_none());
    }

    #[test]
    fn unlimited_consume_serializes_null_remaining() {
        let response = ConsumeResponse::new(
            UsageCounter::Downloads,
            ConsumeOutcome {
                allowed: true,
                remaining: Remaining::Unlimited,
            },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["remaining"], serde_json::Value::Null);
        assert_eq!(json["unlimited"], true);
        assert_eq!(json["counter"], "downloads");
    }

    #[test]
    fn limited_consume_reports_remaining() {
        let response = ConsumeResponse::new(
            UsageCounter::Bundles,
            ConsumeOutcome {
                allowed: false,
                remaining: Remaining::Limited(0),
            },
        );
        assert_eq!(response.remaining, Some(0));
        assert!(!response.unlimited);
        assert!(!response.allowed);
    }
}
