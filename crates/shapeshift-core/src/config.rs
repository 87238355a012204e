//! Engine configuration
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};

/// How a floating point value is converted into an integer member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatToInt {
    /// Truncate toward zero, failing only when out of range or non-finite
    Truncate,
    /// Only accept values with no fractional part
    Reject,
}

/// Configuration shared by every artifact a registry builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum nesting depth of a single eager transformation, unbounded
    /// when unset
    pub max_depth: Option<usize>,
    /// Float to integer conversion policy
    pub float_to_int: FloatToInt,
    /// How many times a type pair may recur on one projection path before
    /// the member is deferred
    pub projection_recursion: usize,
    /// Whether shallow mapping copies navigation members whose source and
    /// destination types are identical
    pub shallow_copies_identical: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            float_to_int: FloatToInt::Truncate,
            projection_recursion: 1,
            shallow_copies_identical: true,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON, missing fields take their defaults
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        if let Ok(depth) = std::env::var("SHAPESHIFT_MAX_DEPTH") {
            match depth.to_lowercase().as_str() {
                "" | "none" | "unlimited" => self.max_depth = None,
                value => match value.parse() {
                    Ok(depth) => self.max_depth = Some(depth),
                    Err(_) => tracing::warn!("Invalid SHAPESHIFT_MAX_DEPTH: {}, using {:?}", depth, self.max_depth),
                },
            }
        }

        if let Ok(policy) = std::env::var("SHAPESHIFT_FLOAT_TO_INT") {
            match policy.to_lowercase().as_str() {
                "truncate" => self.float_to_int = FloatToInt::Truncate,
                "reject" => self.float_to_int = FloatToInt::Reject,
                _ => tracing::warn!("Invalid SHAPESHIFT_FLOAT_TO_INT: {}, using default", policy),
            }
        }

        if let Ok(recursion) = std::env::var("SHAPESHIFT_PROJECTION_RECURSION") {
            match recursion.parse() {
                Ok(recursion) => self.projection_recursion = recursion,
                Err(_) => tracing::warn!(
                    "Invalid SHAPESHIFT_PROJECTION_RECURSION: {}, using {}",
                    recursion,
                    self.projection_recursion
                ),
            }
        }

        if let Ok(copies) = std::env::var("SHAPESHIFT_SHALLOW_COPIES_IDENTICAL") {
            match copies.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => self.shallow_copies_identical = true,
                "false" | "0" | "no" | "off" => self.shallow_copies_identical = false,
                _ => tracing::warn!(
                    "Invalid SHAPESHIFT_SHALLOW_COPIES_IDENTICAL: {}, using {}",
                    copies,
                    self.shallow_copies_identical
                ),
            }
        }
    }

    /// Builder-style setter for the float policy
    pub fn with_float_to_int(mut self, policy: FloatToInt) -> Self {
        self.float_to_int = policy;
        self
    }

    /// Builder-style setter for the projection recursion count
    pub fn with_projection_recursion(mut self, recursion: usize) -> Self {
        self.projection_recursion = recursion;
        self
    }

    /// Builder-style setter for the depth limit
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Builder-style setter for shallow copies of identically typed members
    pub fn with_shallow_copies_identical(mut self, copies: bool) -> Self {
        self.shallow_copies_identical = copies;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_depth, None);
        assert_eq!(config.float_to_int, FloatToInt::Truncate);
        assert_eq!(config.projection_recursion, 1);
        assert!(config.shallow_copies_identical);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{"float_to_int": "reject"}"#).unwrap();
        assert_eq!(config.float_to_int, FloatToInt::Reject);
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(EngineConfig::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_builder_setters() {
        let config = EngineConfig::default()
            .with_max_depth(3)
            .with_projection_recursion(2)
            .with_float_to_int(FloatToInt::Reject)
            .with_shallow_copies_identical(false);
        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.projection_recursion, 2);
        assert_eq!(config.float_to_int, FloatToInt::Reject);
        assert!(!config.shallow_copies_identical);
    }

    #[test]
    fn test_merge_with_env() {
        std::env::set_var("SHAPESHIFT_MAX_DEPTH", "12");
        std::env::set_var("SHAPESHIFT_FLOAT_TO_INT", "Reject");
        std::env::set_var("SHAPESHIFT_PROJECTION_RECURSION", "not-a-number");
        std::env::set_var("SHAPESHIFT_SHALLOW_COPIES_IDENTICAL", "off");

        let mut config = EngineConfig::default();
        config.merge_with_env();

        assert_eq!(config.max_depth, Some(12));
        assert_eq!(config.float_to_int, FloatToInt::Reject);
        // invalid values keep the current setting
        assert_eq!(config.projection_recursion, 1);
        assert!(!config.shallow_copies_identical);

        std::env::set_var("SHAPESHIFT_MAX_DEPTH", "none");
        config.merge_with_env();
        assert_eq!(config.max_depth, None);

        for var in [
            "SHAPESHIFT_MAX_DEPTH",
            "SHAPESHIFT_FLOAT_TO_INT",
            "SHAPESHIFT_PROJECTION_RECURSION",
            "SHAPESHIFT_SHALLOW_COPIES_IDENTICAL",
        ] {
            std::env::remove_var(var);
        }
    }
}
