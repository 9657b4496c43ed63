//! Compile options

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Default tolerance when comparing proportion sums against 1.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// What to do with explicit sibling proportions that do not add up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProportionPolicy {
    /// Reject siblings whose explicit proportions exceed 1
    #[default]
    Strict,
    /// Accept any sum and only log it
    Lenient,
}

/// What to do with trials lost to integer truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Leave the remainder unallocated and report it
    #[default]
    Report,
    /// Hand one extra trial to each sequence with the largest fractional quota
    LargestRemainder,
}

/// Options for one compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CompileOptions {
    pub proportion_policy: ProportionPolicy,
    pub remainder_policy: RemainderPolicy,
    pub tolerance: f64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            proportion_policy: ProportionPolicy::Strict,
            remainder_policy: RemainderPolicy::Report,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl CompileOptions {
    /// Read options from a TOML table. Missing keys keep their defaults.
    ///
    /// ```
    /// use trialtree_core::{CompileOptions, RemainderPolicy};
    ///
    /// let options = CompileOptions::from_toml_str("remainder_policy = \"largest_remainder\"").unwrap();
    /// assert_eq!(options.remainder_policy, RemainderPolicy::LargestRemainder);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(source).map_err(|e| ConfigError::Malformed {
            reason: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "tolerance".to_string(),
                value: self.tolerance.to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        Ok(())
    }

    pub fn lenient() -> Self {
        Self {
            proportion_policy: ProportionPolicy::Lenient,
            ..Self::default()
        }
    }

    pub fn with_remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.remainder_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.proportion_policy, ProportionPolicy::Strict);
        assert_eq!(options.remainder_policy, RemainderPolicy::Report);
        assert_eq!(options.tolerance, DEFAULT_TOLERANCE);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let options = CompileOptions::from_toml_str(
            r#"
proportion_policy = "lenient"
tolerance = 0.001
"#,
        )
        .unwrap();
        assert_eq!(options.proportion_policy, ProportionPolicy::Lenient);
        assert_eq!(options.remainder_policy, RemainderPolicy::Report);
        assert_eq!(options.tolerance, 0.001);
    }

    #[test]
    fn test_from_toml_empty_is_default() {
        assert_eq!(CompileOptions::from_toml_str("").unwrap(), CompileOptions::default());
    }

    #[test]
    fn test_from_toml_rejects_unknown_key() {
        let err = CompileOptions::from_toml_str("rounding = \"up\"").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_from_toml_rejects_unknown_policy() {
        let err = CompileOptions::from_toml_str("remainder_policy = \"random\"").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let err = CompileOptions::from_toml_str("tolerance = -0.5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "tolerance"));
    }
}
