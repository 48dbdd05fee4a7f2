//! Tunable activation rules.
//!
//! The quiz pass mark and the set of training modules that must be
//! completed are configuration, not constants, so cohorts can differ.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default quiz pass mark, in percent of questions answered correctly.
pub const DEFAULT_PASS_THRESHOLD_PERCENT: u8 = 70;

/// Which training modules must be completed before the training gate opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingScope {
    /// Only modules flagged `is_required`.
    #[default]
    Required,
    /// Every module in the catalog.
    All,
}

impl TrainingScope {
    /// Parse a scope name from configuration.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(Self::Required),
            "all" => Ok(Self::All),
            other => Err(CoreError::Validation(format!(
                "Invalid training scope '{other}'. Must be one of: required, all"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::All => "all",
        }
    }
}

/// Rules applied by the activation tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationPolicy {
    /// Minimum share of correct answers, 0..=100, compared without rounding.
    pub pass_threshold_percent: u8,
    pub training_scope: TrainingScope,
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        Self {
            pass_threshold_percent: DEFAULT_PASS_THRESHOLD_PERCENT,
            training_scope: TrainingScope::Required,
        }
    }
}

impl ActivationPolicy {
    /// Build a policy, rejecting a pass mark above 100 %.
    pub fn new(pass_threshold_percent: u8, training_scope: TrainingScope) -> Result<Self, CoreError> {
        if pass_threshold_percent > 100 {
            return Err(CoreError::Validation(format!(
                "Quiz pass threshold must be between 0 and 100, got {pass_threshold_percent}"
            )));
        }
        Ok(Self {
            pass_threshold_percent,
            training_scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_seventy_percent_required_only() {
        let policy = ActivationPolicy::default();
        assert_eq!(policy.pass_threshold_percent, 70);
        assert_eq!(policy.training_scope, TrainingScope::Required);
    }

    #[test]
    fn parse_scope_is_case_insensitive() {
        assert_eq!(TrainingScope::parse("ALL").unwrap(), TrainingScope::All);
        assert_eq!(TrainingScope::parse(" required ").unwrap(), TrainingScope::Required);
        assert!(TrainingScope::parse("some").is_err());
    }

    #[test]
    fn threshold_above_hundred_is_rejected() {
        assert!(ActivationPolicy::new(101, TrainingScope::All).is_err());
        assert!(ActivationPolicy::new(100, TrainingScope::All).is_ok());
        assert!(ActivationPolicy::new(0, TrainingScope::All).is_ok());
    }
}
