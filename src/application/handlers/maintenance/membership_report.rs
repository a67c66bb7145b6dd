//! MembershipReportHandler - operator view of one member.
//!
//! Read failures are logged and reported in `read_errors` instead of
//! failing the whole report.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::UserId;
use crate::domain::membership::MembershipRecord;
use crate::domain::purchase::PurchaseRecord;
use crate::ports::{EntitlementStore, MembershipStore};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipReport {
    pub uid: UserId,
    pub membership: Option<MembershipRecord>,
    pub purchases: Vec<PurchaseRecord>,
    /// Broken record invariants, e.g. active while on free.
    pub violations: Vec<String>,
    pub read_errors: Vec<String>,
}

pub struct MembershipReportHandler {
    memberships: Arc<dyn MembershipStore>,
    entitlements: Arc<dyn EntitlementStore>,
}

impl MembershipReportHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>, entitlements: Arc<dyn EntitlementStore>) -> Self {
        Self {
            memberships,
            entitlements,
        }
    }

    pub async fn handle(&self, uid: &UserId) -> MembershipReport {
        let mut read_errors = Vec::new();

        let membership = match self.memberships.find(uid).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Report could not read membership");
                read_errors.push(format!("membership: {}", e));
                None
            }
        };
        let purchases = match self.entitlements.list_purchases(uid).await {
            Ok(purchases) => purchases,
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Report could not read purchases");
                read_errors.push(format!("purchases: {}", e));
                Vec::new()
            }
        };
        let violations = membership
            .as_ref()
            .map(MembershipRecord::invariant_violations)
            .unwrap_or_default();

        MembershipReport {
            uid: uid.clone(),
            membership,
            purchases,
            violations,
            read_errors,
        }
    }
}
