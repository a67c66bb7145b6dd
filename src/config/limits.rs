//! Free tier quota configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::membership::FreeTierLimits;

/// Usage caps for free members. creator_pro is unlimited.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Downloads per calendar month
    #[serde(default = "default_downloads")]
    pub free_downloads_per_period: u32,

    /// Bundles over the account's lifetime
    #[serde(default = "default_bundles")]
    pub free_bundles: u32,
}

impl LimitsConfig {
    pub fn free_tier(&self) -> FreeTierLimits {
        FreeTierLimits {
            downloads_per_period: self.free_downloads_per_period,
            bundles: self.free_bundles,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.free_downloads_per_period == 0 {
            return Err(ValidationError::InvalidLimit("downloads"));
        }
        if self.free_bundles == 0 {
            return Err(ValidationError::InvalidLimit("bundles"));
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            free_downloads_per_period: default_downloads(),
            free_bundles: default_bundles(),
        }
    }
}

fn default_downloads() -> u32 {
    5
}

fn default_bundles() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_free_tier_defaults() {
        assert_eq!(LimitsConfig::default().free_tier(), FreeTierLimits::default());
    }

    #[test]
    fn zero_caps_are_rejected() {
        let config = LimitsConfig {
            free_bundles: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidLimit("bundles")));
    }
}
