//! Membership status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Subscription status as seen by the platform.
///
/// Status is overwritten wholesale from provider state, so there is no
/// transition table here. The only rule is that `Active` requires the
/// `creator_pro` plan, enforced by `MembershipRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    /// No subscription. The default for free members.
    Inactive,
    Canceled,
    /// Latest invoice failed. Paid features stay on while Stripe retries.
    PastDue,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Inactive => "inactive",
            MembershipStatus::Canceled => "canceled",
            MembershipStatus::PastDue => "past_due",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MembershipStatus::Active),
            "inactive" => Ok(MembershipStatus::Inactive),
            "canceled" => Ok(MembershipStatus::Canceled),
            "past_due" => Ok(MembershipStatus::PastDue),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown membership status '{}'", other),
            )),
        }
    }
}
