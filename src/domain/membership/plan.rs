//! Membership plan definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Billing plan of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipPlan {
    /// Default plan. Usage is capped by `FreeTierLimits`.
    Free,
    /// Paid subscription. No usage caps.
    CreatorPro,
}

impl MembershipPlan {
    pub fn is_paid(&self) -> bool {
        matches!(self, MembershipPlan::CreatorPro)
    }

    /// Storage representation, identical to the serde name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipPlan::Free => "free",
            MembershipPlan::CreatorPro => "creator_pro",
        }
    }
}

impl fmt::Display for MembershipPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipPlan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(MembershipPlan::Free),
            "creator_pro" => Ok(MembershipPlan::CreatorPro),
            other => Err(ValidationError::invalid_format(
                "plan",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&MembershipPlan::CreatorPro).unwrap(),
            "\"creator_pro\""
        );
    }

    #[test]
    fn plan_parses_storage_names() {
        assert_eq!("free".parse::<MembershipPlan>().unwrap(), MembershipPlan::Free);
        assert_eq!(
            "creator_pro".parse::<MembershipPlan>().unwrap(),
            MembershipPlan::CreatorPro
        );
        assert!("gold".parse::<MembershipPlan>().is_err());
    }
}
