//! Error types for remote form operations.
//!
//! Errors fall into two categories. A [`ErrorCategory::Conflict`] means
//! the remote configuration moved on since it was last read; the caller
//! may re-read and retry. Everything else is a [`ErrorCategory::System`]
//! error and is not retryable here.

use crate::backend::RemoteError;
use std::fmt;
use thiserror::Error;

/// Categories of form errors for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Stale revision (retryable after a fresh read)
    Conflict,
    /// Remote failure or untranslatable data
    System,
}

impl ErrorCategory {
    /// Whether a fresh read and retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Conflict => "Configuration changed remotely",
            Self::System => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Conflict => "Re-run the command to diff against the latest remote state",
            Self::System => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while reading, converting, or mutating forms.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote service rejected a write because the revision is stale
    #[error("revision conflict during {operation}: {source}")]
    Conflict {
        /// Operation that was rejected
        operation: &'static str,
        #[source]
        source: RemoteError,
    },

    /// Any other remote service failure
    #[error("remote error during {operation}: {source}")]
    Remote {
        /// Operation that failed
        operation: &'static str,
        #[source]
        source: RemoteError,
    },

    /// A type tag outside the known set
    #[error("unknown element type '{tag}' in {context}")]
    UnknownElementType {
        /// The unrecognized tag
        tag: String,
        /// Conversion boundary where it appeared
        context: &'static str,
    },

    /// A known tag used where it is not allowed
    #[error("element type '{tag}' is not allowed in {context}")]
    UnexpectedElementType {
        tag: String,
        context: &'static str,
    },

    /// A required member is missing from a wire payload
    #[error("{element}: missing required property '{property}'")]
    MissingProperty {
        /// Element (code or kind) being converted
        element: String,
        property: &'static str,
    },

    /// A wire payload has the wrong shape
    #[error("malformed {context}: {message}")]
    Malformed {
        context: String,
        message: String,
    },

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the error category for retry decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Conflict { .. } => ErrorCategory::Conflict,
            _ => ErrorCategory::System,
        }
    }

    /// Whether a fresh read and retry may succeed.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Check if this is a stale-revision conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Translate a remote failure, separating stale revisions from the rest.
    pub fn from_remote(operation: &'static str, source: RemoteError) -> Self {
        if source.is_stale_revision() {
            Error::Conflict { operation, source }
        } else {
            Error::Remote { operation, source }
        }
    }

    pub(crate) fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Malformed {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Result type for form operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_revision_is_conflict() {
        let err = Error::from_remote("update layout", RemoteError::stale_revision("revision 3 is old"));
        assert!(err.is_conflict());
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_remote_failures_are_system() {
        let err = Error::from_remote(
            "add elements",
            RemoteError::new("field code already used").with_code("GAIA_FC01"),
        );
        assert!(!err.is_conflict());
        assert_eq!(err.category(), ErrorCategory::System);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_conversion_errors_are_system() {
        let err = Error::UnknownElementType {
            tag: "HOLOGRAM".into(),
            context: "field definition",
        };
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(
            err.to_string(),
            "unknown element type 'HOLOGRAM' in field definition"
        );
    }

    #[test]
    fn test_remote_cause_is_kept() {
        use std::error::Error as _;

        let err = Error::from_remote("get layout", RemoteError::new("503 unavailable").with_status(503));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "503 unavailable");
    }
}
