//! Processing state of a webhook event in the event log.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Where an event stands in reconciliation.
///
/// `unseen` is the absence of a log row. `Recorded` is terminal. `Failed`
/// goes back to `Processing` when the provider redelivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Processing,
    Recorded,
    Failed,
}

impl ProcessingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingState::Processing => "processing",
            ProcessingState::Recorded => "recorded",
            ProcessingState::Failed => "failed",
        }
    }
}

impl StateMachine for ProcessingState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ProcessingState::*;
        matches!(
            (self, target),
            (Processing, Recorded)
                | (Processing, Failed)
                | (Failed, Processing)
                // Redelivery reclaims a row still in flight or left by a crash.
                | (Processing, Processing)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ProcessingState::*;
        match self {
            Processing => vec![Processing, Recorded, Failed],
            Failed => vec![Processing],
            Recorded => vec![],
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(ProcessingState::Processing),
            "recorded" => Ok(ProcessingState::Recorded),
            "failed" => Ok(ProcessingState::Failed),
            other => Err(ValidationError::invalid_format(
                "state",
                format!("unknown processing state '{}'", other),
            )),
        }
    }
}
