//! Error types for dirsync-compiler.

use thiserror::Error;

use dirsync_core::ValidationError;

/// All errors that can arise while compiling a desired state into requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Field-level validation failure (bad shape, illegal transition, ...).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Two custom attribute names collapse to the same alphanumeric form.
    #[error("attributes '{first}' and '{second}' both sanitize to '{sanitized}'")]
    AttributeCollision {
        first: String,
        second: String,
        sanitized: String,
    },

    /// A custom attribute name with no alphanumeric characters at all.
    #[error("attribute name '{name}' has no alphanumeric characters")]
    EmptyAttributeName { name: String },

    /// An entry of a nested list is not a mapping, or lacks a required key.
    #[error("invalid entry {index} in '{field}': {reason}")]
    InvalidRecord {
        field: &'static str,
        index: usize,
        reason: String,
    },
}
