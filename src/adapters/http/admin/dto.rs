//! Data Transfer Objects for operator endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::membership::SubscriptionApplied;
use crate::domain::membership::{MembershipRecord, MembershipStatus};
use crate::ports::RefundReceipt;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResyncResponse {
    /// `creator_pro`, `downgraded` or `unchanged`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MembershipStatus>,
    pub membership: MembershipRecord,
}

impl ResyncResponse {
    pub fn new(applied: SubscriptionApplied, membership: MembershipRecord) -> Self {
        let (outcome, status) = match applied {
            SubscriptionApplied::CreatorPro(status) => ("creator_pro", Some(status)),
            SubscriptionApplied::Downgraded(status) => ("downgraded", Some(status)),
            SubscriptionApplied::Unchanged => ("unchanged", None),
        };
        Self {
            outcome: outcome.to_string(),
            status,
            membership,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillResponse {
    pub grants_created: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResponse {
    pub refund_id: String,
    pub status: String,
}

impl From<RefundReceipt> for RefundResponse {
    fn from(receipt: RefundReceipt) -> Self {
        Self {
            refund_id: receipt.refund_id,
            status: receipt.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneRequest {
    pub older_than_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneResponse {
    pub deleted: u64,
}
