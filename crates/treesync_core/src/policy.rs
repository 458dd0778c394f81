//! Synchronization policy.
//!
//! Applies the [`ChangeRule`] of a set of rules to single attribute writes,
//! and runs the deletion pass of [`ChangeRule::Update`] once a node's
//! document object has been read completely.

use crate::error::{SyncError, SyncResult};
use crate::report::ImportReport;
use crate::rules::{ChangeRule, MappingRules};
use std::collections::HashSet;
use treesync_codec::Attribute;
use treesync_store::{NodeHandle, NodeStore, PRIMARY_TYPE};

/// Result of one attribute write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value was written.
    Written,
    /// The value was written after clearing a value of the other arity.
    Repaired,
    /// The node already had a value and the rule kept it.
    Kept,
}

/// Names met while reading one document object.
#[derive(Debug, Default)]
pub struct Seen {
    attributes: HashSet<String>,
    children: HashSet<String>,
}

impl Seen {
    /// Records an attribute name.
    pub fn attribute(&mut self, name: &str) {
        self.attributes.insert(name.to_string());
    }

    /// Records a child name.
    pub fn child(&mut self, name: &str) {
        self.children.insert(name.to_string());
    }

    /// Returns true if the attribute was met.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Returns true if the child was met.
    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains(name)
    }
}

/// The merge semantics of one import call.
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy<'a> {
    rules: &'a MappingRules,
}

impl<'a> SyncPolicy<'a> {
    /// Creates a policy for the given rules.
    pub fn new(rules: &'a MappingRules) -> Self {
        Self { rules }
    }

    /// The rule being applied.
    pub fn rule(&self) -> ChangeRule {
        self.rules.change_rule
    }

    /// Writes one attribute.
    ///
    /// Under [`ChangeRule::Extend`] an attribute the node already has is left
    /// alone. A write the store rejects because the stored value has the
    /// other arity is retried once after clearing the attribute.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Constraint`] if the store refuses the write, and
    /// [`SyncError::Store`] if the store fails.
    pub fn write<S: NodeStore + ?Sized>(
        &self,
        store: &mut S,
        node: &NodeHandle,
        attribute: Attribute,
    ) -> SyncResult<WriteOutcome> {
        let name = attribute.name().to_string();
        if self.rule() == ChangeRule::Extend && store.attribute(node, &name)?.is_some() {
            tracing::trace!(path = %node.path(), name = %name, "existing value kept");
            return Ok(WriteOutcome::Kept);
        }

        match store.set_attribute(node, attribute.clone()) {
            Ok(()) => Ok(WriteOutcome::Written),
            Err(err) if err.is_arity_mismatch() => {
                tracing::debug!(path = %node.path(), name = %name, "arity changed, rewriting");
                store
                    .clear_attribute(node, &name)
                    .map_err(|e| SyncError::from_write(&name, e))?;
                store
                    .set_attribute(node, attribute)
                    .map_err(|e| SyncError::from_write(&name, e))?;
                Ok(WriteOutcome::Repaired)
            }
            Err(err) => Err(SyncError::from_write(&name, err)),
        }
    }

    /// Removes what the document omitted, under [`ChangeRule::Update`].
    ///
    /// Clears every attribute that was not seen, passes the import filter
    /// and is not the primary type, then deletes every child that was not
    /// seen and passes the child filter. Failures are recorded in the report
    /// and do not stop the pass.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the store cannot be read.
    pub fn prune<S: NodeStore + ?Sized>(
        &self,
        store: &mut S,
        node: &NodeHandle,
        seen: &Seen,
        report: &mut ImportReport,
    ) -> SyncResult<()> {
        if self.rule() != ChangeRule::Update {
            return Ok(());
        }
        let path = node.path().to_string();

        for attribute in store.attributes(node)? {
            let name = attribute.name();
            if name == PRIMARY_TYPE
                || seen.has_attribute(name)
                || !self.rules.import_attribute_filter.accept(name)
            {
                continue;
            }
            match store.clear_attribute(node, name) {
                Ok(()) => {
                    tracing::debug!(path = %path, name, "attribute cleared");
                    report.cleared += 1;
                }
                Err(err) => report.record_skip(&path, name, &SyncError::from_write(name, err)),
            }
        }

        for child in store.children(node)? {
            if seen.has_child(child.name()) || !self.rules.child_filter.accept(&child) {
                continue;
            }
            match store.delete_node(&child) {
                Ok(()) => {
                    tracing::debug!(path = %child.path(), "child deleted");
                    report.deleted += 1;
                }
                Err(err) => {
                    let err = SyncError::from_node(child.path(), err);
                    report.record_child_failure(child.path().as_str(), &err);
                }
            }
        }
        Ok(())
    }
}
