//! Purchase status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Completed,
    Failed,
    Refunded,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
            PurchaseStatus::Refunded => "refunded",
        }
    }

    /// Whether a grant backed by a purchase in this status is effective.
    pub fn grants_access(&self) -> bool {
        matches!(self, PurchaseStatus::Completed)
    }
}

impl StateMachine for PurchaseStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (PurchaseStatus::Completed, PurchaseStatus::Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            PurchaseStatus::Completed => vec![PurchaseStatus::Refunded],
            PurchaseStatus::Failed | PurchaseStatus::Refunded => vec![],
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(PurchaseStatus::Completed),
            "failed" => Ok(PurchaseStatus::Failed),
            "refunded" => Ok(PurchaseStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown purchase status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_can_be_refunded() {
        assert!(PurchaseStatus::Completed.can_transition_to(&PurchaseStatus::Refunded));
        assert!(!PurchaseStatus::Failed.can_transition_to(&PurchaseStatus::Refunded));
        assert!(PurchaseStatus::Refunded.is_terminal());
    }

    #[test]
    fn only_completed_grants_access() {
        assert!(PurchaseStatus::Completed.grants_access());
        assert!(!PurchaseStatus::Refunded.grants_access());
        assert!(!PurchaseStatus::Failed.grants_access());
    }
}
