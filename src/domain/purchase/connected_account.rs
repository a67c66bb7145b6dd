//! Creator-side connected payment account.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CreatorId, Timestamp};
use crate::domain::payment::AccountSnapshot;

/// Cached Stripe Connect state for a creator.
///
/// Stripe is the source of truth; this record is refreshed from it and
/// may lag behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedAccount {
    pub creator_id: CreatorId,
    pub account_id: String,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
    pub refreshed_at: Timestamp,
}

impl ConnectedAccount {
    /// Freshly created account, nothing enabled yet.
    pub fn pending(creator_id: CreatorId, account_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            creator_id,
            account_id: account_id.into(),
            charges_enabled: false,
            payouts_enabled: false,
            details_submitted: false,
            refreshed_at: now,
        }
    }

    pub fn from_snapshot(creator_id: CreatorId, snapshot: &AccountSnapshot, now: Timestamp) -> Self {
        Self {
            creator_id,
            account_id: snapshot.account_id.clone(),
            charges_enabled: snapshot.charges_enabled,
            payouts_enabled: snapshot.payouts_enabled,
            details_submitted: snapshot.details_submitted,
            refreshed_at: now,
        }
    }

    /// Creator can sell and get paid.
    pub fn is_fully_onboarded(&self) -> bool {
        self.charges_enabled && self.payouts_enabled && self.details_submitted
    }
}
