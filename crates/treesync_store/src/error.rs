//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No node exists at the path.
    #[error("node not found: {path}")]
    NotFound {
        /// The path that was looked up.
        path: String,
    },

    /// A node already exists at the path.
    #[error("node already exists: {path}")]
    AlreadyExists {
        /// The occupied path.
        path: String,
    },

    /// A single value was written over a multi value or vice versa.
    #[error("attribute {name} on {path} is {existing}, cannot write a {attempted} value")]
    ArityMismatch {
        /// Node path.
        path: String,
        /// Attribute name.
        name: String,
        /// Arity of the stored attribute.
        existing: &'static str,
        /// Arity of the rejected write.
        attempted: &'static str,
    },

    /// The node's type does not permit the operation.
    #[error("constraint violation on {path}: {message}")]
    ConstraintViolation {
        /// Node path.
        path: String,
        /// What was violated.
        message: String,
    },

    /// The text is not a valid node path or node name.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected text.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The node type is not registered.
    #[error("unknown node type: {name}")]
    UnknownNodeType {
        /// The type name.
        name: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A snapshot could not be read or written.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    /// Creates a constraint violation error.
    pub fn constraint(path: impl ToString, message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if the write was rejected only because of the arity of
    /// the stored value.
    pub fn is_arity_mismatch(&self) -> bool {
        matches!(self, Self::ArityMismatch { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}
