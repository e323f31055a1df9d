//! Error types for dirsync-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::lifecycle::State;

/// Errors raised while validating a desired state, before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The requested lifecycle transition is not in the transition table.
    #[error("illegal state transition {from} -> {to}")]
    IllegalTransition { from: State, to: State },

    /// A `state` value that is not one of STAGED, ACTIVATED, SUSPENDED.
    #[error("unknown state '{value}'; expected STAGED, ACTIVATED or SUSPENDED")]
    UnknownState { value: String },

    /// A timestamp that could not be parsed as an RFC 3339 datetime or a date.
    #[error("malformed timestamp in {field}: '{value}'")]
    MalformedTimestamp { field: &'static str, value: String },

    /// A field is present but carries a value of the wrong shape.
    #[error("field '{field}' must be {expected}")]
    FieldType { field: String, expected: &'static str },

    /// A field required for this operation is absent.
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
}

/// Errors from loading desired-state documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load, with the offending file path.
    #[error("failed to parse desired-state document at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document file does not exist.
    #[error("desired-state document not found at {path}")]
    NotFound { path: PathBuf },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
