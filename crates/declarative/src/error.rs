//! Error types for project parsing and planning.
//!
//! Every error here is a validation or business-rule failure. They are
//! raised before any remote call is made and are never retried. Each
//! variant carries a stable machine-readable code (see [`Error::code`])
//! alongside the offending identifiers.

use thiserror::Error;

/// Errors raised while parsing a project document or building a plan.
#[derive(Debug, Error)]
pub enum Error {
    /// The document could not be read into the expected shape
    #[error("invalid project document: {message}")]
    InvalidDocument {
        /// What was wrong with the document
        message: String,
    },

    /// The document declares no applications
    #[error("project declares no applications")]
    EmptyProject,

    /// An application name is not path-safe
    #[error("invalid application name {name:?}: {reason}")]
    InvalidAppName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// An application has an empty remote identifier
    #[error("application '{app}' has an empty appId")]
    EmptyAppId {
        /// Name of the application
        app: String,
    },

    /// An application depends on a name that is not declared
    #[error("application '{app}' depends on unknown application '{dependency}'")]
    UnknownDependency {
        /// Application declaring the dependency
        app: String,
        /// The dependency that could not be resolved
        dependency: String,
    },

    /// The dependency graph contains a cycle
    #[error("circular dependency between applications: {}", .apps.join(", "))]
    CircularDependency {
        /// Every application left unresolved, sorted by name
        apps: Vec<String>,
    },

    /// A selection named applications that are not part of the plan
    #[error("unknown application(s): {}", .apps.join(", "))]
    UnknownApp {
        /// The names that were not found
        apps: Vec<String>,
    },
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDocument { .. } => "INVALID_DOCUMENT",
            Self::EmptyProject => "EMPTY_PROJECT",
            Self::InvalidAppName { .. } => "INVALID_APP_NAME",
            Self::EmptyAppId { .. } => "EMPTY_APP_ID",
            Self::UnknownDependency { .. } => "UNKNOWN_DEPENDENCY",
            Self::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            Self::UnknownApp { .. } => "UNKNOWN_APP",
        }
    }

    pub(crate) fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid_document(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_document(err.to_string())
    }
}

/// Result type for project and planning operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let err = Error::UnknownDependency {
            app: "orders".into(),
            dependency: "customers".into(),
        };
        assert_eq!(err.code(), "UNKNOWN_DEPENDENCY");
        assert_eq!(
            err.to_string(),
            "application 'orders' depends on unknown application 'customers'"
        );
    }

    #[test]
    fn test_circular_dependency_lists_apps() {
        let err = Error::CircularDependency {
            apps: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.code(), "CIRCULAR_DEPENDENCY");
        assert_eq!(err.to_string(), "circular dependency between applications: a, b");
    }
}
