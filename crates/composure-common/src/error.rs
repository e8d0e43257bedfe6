//! Unified error types for the Composure workspace.
//!
//! Every failure in the normalization pipeline is fail-fast: the first
//! detected error aborts the whole call and no partial output is produced.

use thiserror::Error;

/// A structural or format violation reported by a schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema validation failed at {instance_path}: {message}")]
pub struct SchemaError {
    /// JSON Pointer to the violating value in the document (`/` for the root).
    pub instance_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl SchemaError {
    /// Creates a schema error for the given document location.
    pub fn new(instance_path: impl Into<String>, message: impl Into<String>) -> Self {
        let instance_path = instance_path.into();
        Self {
            instance_path: if instance_path.is_empty() {
                "/".to_string()
            } else {
                instance_path
            },
            message: message.into(),
        }
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The input is malformed or semantically invalid.
    #[error("{message}")]
    Validation {
        /// Description of the violation.
        message: String,
    },

    /// The declared composition version is not one this crate understands.
    #[error("Unsupported composition version: {version}")]
    UnsupportedVersion {
        /// The version tag as it appeared in the input, after coercion to text.
        version: String,
    },

    /// The schema validator rejected the document.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A `${NAME?message}` or `${NAME:?message}` reference could not be satisfied.
    #[error("{message}")]
    Expansion {
        /// The user-supplied message from the reference.
        message: String,
    },

    /// An env file could not be fetched or decoded.
    #[error("failed to read env file '{path}': {reason}")]
    EnvFile {
        /// Normalized path of the env file.
        path: String,
        /// Description of the underlying failure.
        reason: String,
    },

    /// An invariant that normalization guarantees did not hold.
    #[error("internal inconsistency: {message}")]
    InternalInconsistency {
        /// Description of the broken invariant.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl ComposeError {
    /// Shorthand for a [`ComposeError::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` for every error caused by invalid user input.
    ///
    /// Schema failures and unsupported versions are reported to callers as
    /// validation errors.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::UnsupportedVersion { .. } | Self::Schema(_)
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ComposeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_defaults_to_root_path() {
        let err = SchemaError::new("", "expected object");
        assert_eq!(err.instance_path, "/");
        assert_eq!(
            err.to_string(),
            "schema validation failed at /: expected object"
        );
    }

    #[test]
    fn schema_errors_count_as_validation() {
        let err: ComposeError = SchemaError::new("/services", "bad").into();
        assert!(err.is_validation());
        assert!(
            ComposeError::UnsupportedVersion {
                version: "9".into()
            }
            .is_validation()
        );
    }

    #[test]
    fn expansion_error_is_not_validation() {
        let err = ComposeError::Expansion {
            message: "err".into(),
        };
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "err");
    }
}
