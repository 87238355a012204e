//! Error types for the Shapeshift core library
//!
//! This module defines the error handling system for the mapping engine,
//! using thiserror for ergonomic error definitions. User supplied closures
//! report failures through anyhow, which is folded into [`Error::Construction`].
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Main error type for Shapeshift operations
///
/// Every variant is cheap to clone so that failed builds can be cached next
/// to successful ones and handed to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Plan-build failure for a type pair
    #[error("Configuration error for {pair}{}: {message}", member_suffix(.member))]
    Configuration {
        pair: String,
        member: Option<String>,
        message: String,
    },

    /// A pair was registered twice, or registered after first use
    #[error("Mapping from {source_type} to {destination_type} is already registered")]
    DuplicateRegistration {
        source_type: String,
        destination_type: String,
    },

    /// A recorded scalar coercion failed on a concrete value
    #[error("Conversion failed at '{path}': cannot convert {value} from {from} to {to}")]
    Conversion {
        path: String,
        from: String,
        to: String,
        value: String,
    },

    /// Serde round trip failure at the typed boundary
    #[error("Materialization of {type_name} failed: {message}")]
    Materialization {
        type_name: String,
        message: String,
    },

    /// The projection interpreter met an input it cannot evaluate
    #[error("Projection evaluation failed: {message}")]
    Evaluation { message: String },

    /// A user supplied construction or compute function failed
    #[error("Custom construction of {type_name} failed: {message}")]
    Construction {
        type_name: String,
        message: String,
    },

    /// Unsupported feature or operation
    #[error("Unsupported operation: {message}")]
    Unsupported {
        message: String,
        feature: Option<String>,
    },

    /// Nested transformation went deeper than the configured limit
    #[error("Maximum mapping depth of {limit} exceeded")]
    DepthExceeded { limit: usize },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

fn member_suffix(member: &Option<String>) -> String {
    match member {
        Some(name) => format!(" (member '{}')", name),
        None => String::new(),
    }
}

impl Error {
    /// Build a configuration error for a pair, optionally naming a member
    pub fn configuration(
        pair: impl Into<String>,
        member: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Error::Configuration {
            pair: pair.into(),
            member: member.map(str::to_string),
            message: message.into(),
        }
    }

    /// Build an evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        Error::Evaluation {
            message: message.into(),
        }
    }

    /// Wrap an anyhow error coming from user code
    pub fn construction(type_name: impl Into<String>, err: anyhow::Error) -> Self {
        Error::Construction {
            type_name: type_name.into(),
            message: format!("{:#}", err),
        }
    }

    /// Whether this error is a plan-build (configuration) failure
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Materialization {
            type_name: "value".to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display_names_member() {
        let err = Error::configuration("Customer -> CustomerDto", Some("tags"), "navigation type mismatch");
        assert_eq!(
            err.to_string(),
            "Configuration error for Customer -> CustomerDto (member 'tags'): navigation type mismatch"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_configuration_display_without_member() {
        let err = Error::configuration("A -> B", None, "ambiguous destination");
        assert_eq!(err.to_string(), "Configuration error for A -> B: ambiguous destination");
    }

    #[test]
    fn test_construction_keeps_context_chain() {
        let err = anyhow::anyhow!("root cause").context("while building");
        let err = Error::construction("CityDto", err);
        assert!(err.to_string().contains("while building"));
        assert!(err.to_string().contains("root cause"));
    }
}
