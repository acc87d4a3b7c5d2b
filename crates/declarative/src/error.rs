//! Error types for the declarative framework.
//!
//! These cover the failures the framework itself detects: malformed
//! identifiers, schema violations, and inconsistencies between what the
//! configuration declares and what the device reports back. Device and
//! transport errors never pass through here; resources surface those
//! directly.

use thiserror::Error;

/// Errors raised by the declarative framework.
#[derive(Debug, Error)]
pub enum Error {
    /// An identifier did not split into the expected number of components
    #[error("identifier {id:?} has {found} components, expected {expected}")]
    IdArity {
        /// The offending identifier
        id: String,
        /// Number of components the identifier type requires
        expected: usize,
        /// Number of components actually present
        found: usize,
    },

    /// A component value contains the identifier separator
    #[error("identifier component {value:?} contains the separator ':'")]
    IdComponent {
        /// The component value
        value: String,
    },

    /// A schema definition is internally inconsistent
    #[error("invalid schema for {attribute}: {message}")]
    SchemaDefinition {
        /// Attribute the problem was found on
        attribute: String,
        /// Description of the problem
        message: String,
    },

    /// A configuration value violates the schema
    #[error("{attribute}: {message}")]
    Validation {
        /// Attribute that failed validation
        attribute: String,
        /// Description of the violation
        message: String,
    },

    /// Two mutually exclusive attributes were both set
    #[error("{first} conflicts with {second}")]
    Conflict {
        /// First attribute
        first: String,
        /// Second attribute
        second: String,
    },

    /// Config-side and device-side collections disagree
    #[error("{field}[{index}]: {message}")]
    StateInconsistency {
        /// Collection attribute being reconciled
        field: String,
        /// Index of the offending element
        index: usize,
        /// Description of the mismatch
        message: String,
    },

    /// Stored state could not be migrated to the current schema
    #[error("cannot upgrade state from schema version {from}: {message}")]
    Upgrade {
        /// Version the stored state was written with
        from: u32,
        /// Description of the failure
        message: String,
    },

    /// No resource or data source is registered under the name
    #[error("unknown {kind} type: {name}")]
    UnknownType {
        /// "resource" or "data source"
        kind: &'static str,
        /// The requested type name
        name: String,
    },

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a validation error on an attribute.
    pub fn validation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised before any device call could happen.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaDefinition { .. }
                | Self::Validation { .. }
                | Self::Conflict { .. }
                | Self::IdComponent { .. }
        )
    }
}

/// Result type for declarative operations.
pub type Result<T> = std::result::Result<T, Error>;
