//! Import summary.

use crate::error::SyncError;
use crate::policy::WriteOutcome;
use serde::Serialize;
use std::fmt;

/// Kind of a recorded import problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The value could not be decoded.
    ValueFormat,
    /// The store refused the write.
    Constraint,
    /// A node could not be created or removed.
    Structural,
}

/// One problem the importer stepped over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportIssue {
    /// Path of the node concerned.
    pub path: String,
    /// Attribute name, for attribute-level issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// What kind of problem it was.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
}

/// What an import did.
///
/// Attribute and child failures never fail the call; they are counted here
/// and described in [`issues`](Self::issues).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Nodes created.
    pub nodes_created: usize,
    /// Attributes written.
    pub written: usize,
    /// Attributes left untouched because the node already had a value.
    pub kept: usize,
    /// Attributes written after clearing a value of the other arity.
    pub repaired: usize,
    /// Existing attributes removed by an update.
    pub cleared: usize,
    /// Existing children removed by an update.
    pub deleted: usize,
    /// Attributes that could not be decoded or written.
    pub skipped: usize,
    /// Child subtrees that could not be imported.
    pub failed_children: usize,
    /// Details of every skipped attribute and failed child.
    pub issues: Vec<ImportIssue>,
}

impl ImportReport {
    /// Returns true if nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub(crate) fn record_write(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => self.written += 1,
            WriteOutcome::Repaired => {
                self.written += 1;
                self.repaired += 1;
            }
            WriteOutcome::Kept => self.kept += 1,
        }
    }

    pub(crate) fn record_skip(&mut self, path: &str, name: &str, err: &SyncError) {
        tracing::warn!(path, name, error = %err, "attribute skipped");
        self.skipped += 1;
        self.issues.push(ImportIssue {
            path: path.to_string(),
            name: Some(name.to_string()),
            kind: issue_kind(err),
            message: err.to_string(),
        });
    }

    pub(crate) fn record_child_failure(&mut self, path: &str, err: &SyncError) {
        tracing::warn!(path, error = %err, "child skipped");
        self.failed_children += 1;
        self.issues.push(ImportIssue {
            path: path.to_string(),
            name: None,
            kind: IssueKind::Structural,
            message: err.to_string(),
        });
    }
}

fn issue_kind(err: &SyncError) -> IssueKind {
    match err {
        SyncError::ValueFormat { .. } => IssueKind::ValueFormat,
        SyncError::Structural { .. } => IssueKind::Structural,
        _ => IssueKind::Constraint,
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {} nodes, wrote {} attributes ({} repaired), kept {}, cleared {}, deleted {} children, skipped {}, failed children {}",
            self.nodes_created,
            self.written,
            self.repaired,
            self.kept,
            self.cleared,
            self.deleted,
            self.skipped,
            self.failed_children
        )
    }
}
