//! Error types for device operations.
//!
//! Errors are categorized so callers can tell a missing object (often not
//! a failure at all) apart from a device that refused the request or a
//! connection that broke.

use thiserror::Error;

/// Categories of device errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The object (or a container it lives in) does not exist
    NotFound,
    /// The device type cannot hold this kind of object
    Unsupported,
    /// The scoping values do not describe a valid location
    Scope,
    /// The device rejected the request
    Device,
    /// The request never got a response
    Transport,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Object not found",
            Self::Unsupported => "Not supported on this device",
            Self::Scope => "Invalid scope",
            Self::Device => "Device rejected the request",
            Self::Transport => "Device unreachable",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Check the object name and the template, device group, or vsys it lives in",
            Self::Unsupported => "Use a firewall or Panorama connection as the resource requires",
            Self::Scope => "Set at most one of template and template_stack",
            Self::Device => "Check the error details reported by the device",
            Self::Transport => "Check the hostname and network connectivity",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during device operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Object does not exist
    #[error("{kind} not found: {name}")]
    ObjectNotFound {
        /// Kind of object that was looked up
        kind: String,
        /// Name that was looked up
        name: String,
    },

    /// The device type does not support this operation or family
    #[error("{what} is not supported on {device}")]
    Unsupported {
        /// Device type
        device: String,
        /// What was attempted
        what: String,
    },

    /// Scoping values are contradictory or incomplete
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// The device answered with an error
    #[error("device error: {0}")]
    Device(String),

    /// The device could not be reached
    #[error("transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a not-found error.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ObjectNotFound { .. } => ErrorCategory::NotFound,
            Error::Unsupported { .. } => ErrorCategory::Unsupported,
            Error::InvalidScope(_) => ErrorCategory::Scope,
            Error::Device(_) => ErrorCategory::Device,
            Error::Transport(_) => ErrorCategory::Transport,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether the object simply does not exist.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_predicate() {
        assert!(Error::not_found("application", "app1").is_not_found());
        assert!(!Error::Device("commit lock held".into()).is_not_found());
        assert!(!Error::Transport("connection refused".into()).is_not_found());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::not_found("virtual-router", "vr1").to_string(),
            "virtual-router not found: vr1"
        );
        assert_eq!(
            Error::Unsupported {
                device: "firewall".into(),
                what: "device groups".into()
            }
            .to_string(),
            "device groups is not supported on firewall"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::InvalidScope("x".into()).category(),
            ErrorCategory::Scope
        );
        assert_eq!(Error::Other("x".into()).category(), ErrorCategory::Other);
        assert!(!ErrorCategory::NotFound.advice().is_empty());
    }
}
