#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VerificationLevel {
    /// Structural checks only.
    Structure,
    /// Structural checks followed by dominance checks.
    #[default]
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VerifierConfig {
    pub level: VerificationLevel,
}

impl VerifierConfig {
    pub fn for_level(level: VerificationLevel) -> Self {
        Self { level }
    }

    pub fn should_check_dominance(&self) -> bool {
        matches!(self.level, VerificationLevel::Full)
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::for_level(VerificationLevel::Full)
    }
}
