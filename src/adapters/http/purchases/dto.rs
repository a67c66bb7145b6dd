//! Data Transfer Objects for purchase and access endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::purchase::CheckAccessResult;
use crate::domain::foundation::Timestamp;
use crate::domain::purchase::{PurchaseRecord, PurchaseStatus};

/// A purchase as shown to its buyer.
///
/// Provider references such as the payment intent stay server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub id: String,
    pub product_box_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: PurchaseStatus,
    pub purchased_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_at: Option<Timestamp>,
}

impl From<PurchaseRecord> for PurchaseResponse {
    fn from(record: PurchaseRecord) -> Self {
        Self {
            id: record.id.into_inner(),
            product_box_id: record.product_box_id.into_inner(),
            creator_id: record.creator_id.map(|c| c.into_inner()),
            amount: record.amount,
            currency: record.currency,
            status: record.status,
            purchased_at: record.purchased_at,
            refunded_at: record.refunded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub product_box_id: String,
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_id: Option<String>,
}

impl AccessResponse {
    pub fn new(product_box_id: String, result: CheckAccessResult) -> Self {
        Self {
            product_box_id,
            has_access: result.has_access,
            purchase_id: result.purchase_id,
        }
    }
}
