//! Error types for the synchronization engine.

use std::fmt;
use thiserror::Error;
use treesync_store::StoreError;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while exporting or importing a tree.
///
/// The importer works best-effort: [`ValueFormat`](Self::ValueFormat),
/// [`Constraint`](Self::Constraint) and [`Structural`](Self::Structural)
/// errors are recorded in the import report and the call continues. Every
/// other kind aborts the call.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The document is not well-formed JSON, or not an object.
    #[error("malformed document: {0}")]
    Transport(#[source] serde_json::Error),

    /// An attribute value could not be decoded.
    #[error("invalid value for {name}: {message}")]
    ValueFormat {
        /// Attribute name.
        name: String,
        /// What was wrong with the value.
        message: String,
    },

    /// The store refused an attribute write.
    #[error("cannot write {name}: {message}")]
    Constraint {
        /// Attribute name.
        name: String,
        /// The store's reason.
        message: String,
    },

    /// A node could not be resolved, created or removed.
    #[error("cannot import node {path}: {message}")]
    Structural {
        /// Node path.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The document could not be rendered.
    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Creates a value format error.
    pub fn value_format(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ValueFormat {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Creates a constraint error.
    pub fn constraint(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Constraint {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Creates a structural error.
    pub fn structural(path: impl ToString, message: impl fmt::Display) -> Self {
        Self::Structural {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Classifies a store error raised by an attribute write.
    ///
    /// Type and shape violations become [`SyncError::Constraint`]; anything
    /// else is a store failure.
    pub fn from_write(name: &str, err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation { .. }
            | StoreError::ArityMismatch { .. }
            | StoreError::UnknownNodeType { .. }
            | StoreError::InvalidPath { .. } => Self::constraint(name, err),
            other => Self::Store(other),
        }
    }

    /// Classifies a store error raised while creating or deleting a node.
    pub fn from_node(path: impl ToString, err: StoreError) -> Self {
        match err {
            StoreError::Io(_) | StoreError::Snapshot(_) => Self::Store(err),
            other => Self::structural(path, other),
        }
    }

    /// Returns true if the import can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ValueFormat { .. } | Self::Constraint { .. } | Self::Structural { .. }
        )
    }
}
