//! Data Transfer Objects for creator Connect endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::purchase::ConnectedAccount;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedAccountResponse {
    pub account_id: String,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
    pub onboarded: bool,
    pub refreshed_at: Timestamp,
}

impl From<ConnectedAccount> for ConnectedAccountResponse {
    fn from(account: ConnectedAccount) -> Self {
        Self {
            onboarded: account.is_fully_onboarded(),
            account_id: account.account_id,
            charges_enabled: account.charges_enabled,
            payouts_enabled: account.payouts_enabled,
            details_submitted: account.details_submitted,
            refreshed_at: account.refreshed_at,
        }
    }
}

/// GET /api/connect body. `account` is absent before onboarding starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectStatusResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<ConnectedAccountResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub account: ConnectedAccountResponse,
    pub onboarding_url: String,
}
