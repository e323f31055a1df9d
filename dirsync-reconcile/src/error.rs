//! Error types for dirsync-reconcile.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use dirsync_compiler::CompileError;
use dirsync_core::{EntityId, ValidationError};

/// Network phase a transport failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Read,
    Delete,
    Disable,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Read => "read",
            Operation::Delete => "delete",
            Operation::Disable => "disabling update",
        })
    }
}

/// Failure classified by the transport collaborator. Each kind carries the
/// response body text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("not found: {body}")]
    NotFound { body: String },

    #[error("conflict: {body}")]
    Conflict { body: String },

    #[error("bad request: {body}")]
    BadRequest { body: String },

    #[error("unauthorized: {body}")]
    Unauthorized { body: String },

    #[error("forbidden: {body}")]
    Forbidden { body: String },

    #[error("request failed ({}): {body}", describe_status(.status))]
    Generic { status: Option<u16>, body: String },
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_owned(),
    }
}

impl TransportError {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            400 => TransportError::BadRequest { body },
            401 => TransportError::Unauthorized { body },
            403 => TransportError::Forbidden { body },
            404 => TransportError::NotFound { body },
            409 => TransportError::Conflict { body },
            other => TransportError::Generic {
                status: Some(other),
                body,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound { .. })
    }

    pub fn body(&self) -> &str {
        match self {
            TransportError::NotFound { body }
            | TransportError::Conflict { body }
            | TransportError::BadRequest { body }
            | TransportError::Unauthorized { body }
            | TransportError::Forbidden { body }
            | TransportError::Generic { body, .. } => body,
        }
    }
}

/// All errors that can arise from reconcile operations.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Rejected before any network call; no remote state was touched.
    #[error("validation failed: {0}")]
    Validation(#[from] CompileError),

    /// A primary write, read or delete failed.
    #[error("{operation} failed for {id}: {source}")]
    Transport {
        operation: Operation,
        id: String,
        #[source]
        source: TransportError,
    },

    /// The primary write succeeded but the secondary write did not. The
    /// entity exists; resending the secondary request alone is safe.
    #[error("secondary write failed for {id} after the primary write was applied: {source}")]
    SecondaryWrite {
        id: EntityId,
        #[source]
        source: TransportError,
    },

    /// Delete still blocked after the disable-and-retry cycle.
    #[error("delete of {id} still blocked after disabling dependent services: {source}")]
    DeleteBlocked {
        id: EntityId,
        #[source]
        source: TransportError,
    },

    /// The server answered with a body that does not decode.
    #[error("malformed {operation} response: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (request bodies, state store).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ValidationError> for ReconcileError {
    fn from(err: ValidationError) -> Self {
        ReconcileError::Validation(CompileError::Validation(err))
    }
}

impl ReconcileError {
    /// Whether retrying only the secondary write can complete the update.
    pub fn is_secondary_only(&self) -> bool {
        matches!(self, ReconcileError::SecondaryWrite { .. })
    }
}

/// Convenience constructor for [`ReconcileError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReconcileError {
    ReconcileError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn transport_err(
    operation: Operation,
    id: impl fmt::Display,
    source: TransportError,
) -> ReconcileError {
    ReconcileError::Transport {
        operation,
        id: id.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(400, "bad request")]
    #[case(401, "unauthorized")]
    #[case(403, "forbidden")]
    #[case(404, "not found")]
    #[case(409, "conflict")]
    #[case(503, "request failed (HTTP 503)")]
    fn status_classification(#[case] status: u16, #[case] prefix: &str) {
        let err = TransportError::from_status(status, "body");
        assert!(err.to_string().starts_with(prefix), "{err}");
        assert_eq!(err.body(), "body");
    }

    #[rstest]
    #[case(Operation::Create, "create")]
    #[case(Operation::Update, "update")]
    #[case(Operation::Read, "read")]
    #[case(Operation::Delete, "delete")]
    #[case(Operation::Disable, "disabling update")]
    fn operation_names(#[case] operation: Operation, #[case] name: &str) {
        assert_eq!(operation.to_string(), name);
    }

    #[test]
    fn only_404_is_not_found() {
        assert!(TransportError::from_status(404, "").is_not_found());
        assert!(!TransportError::from_status(409, "").is_not_found());
    }

    #[test]
    fn secondary_failure_is_distinct() {
        let err = ReconcileError::SecondaryWrite {
            id: EntityId::from("5f1a"),
            source: TransportError::Generic {
                status: None,
                body: "reset".into(),
            },
        };
        assert!(err.is_secondary_only());
        assert!(err.to_string().contains("5f1a"));
    }
}
