//! Cross-crate integration test helpers.
//!
//! Ties the store, the exporter and the importer together so tests can
//! check whole round trips in one call.

use crate::fixtures::{ensure_path, node, path};
use crate::generators::TreeSpec;
use std::collections::BTreeMap;
use treesync_codec::Attribute;
use treesync_core::{export, import, ImportReport, MappingRules};
use treesync_store::{InMemoryStore, NodeHandle, NodeStore};

/// Attributes of every node in a subtree, keyed by path relative to its
/// root (`""` for the root itself) and then by attribute name.
pub type TreeContents = BTreeMap<String, BTreeMap<String, Attribute>>;

/// Creates `tree` as the child `name` of `parent`.
pub fn build_tree(
    store: &mut InMemoryStore,
    parent: &NodeHandle,
    name: &str,
    tree: &TreeSpec,
) -> NodeHandle {
    let handle = store
        .create_node(parent, name, None)
        .expect("Failed to create node");
    for attribute in &tree.attributes {
        store
            .set_attribute(&handle, attribute.clone())
            .expect("Failed to set attribute");
    }
    for (child_name, child) in &tree.children {
        build_tree(store, &handle, child_name, child);
    }
    handle
}

/// Reads a subtree into comparable form.
pub fn contents(store: &InMemoryStore, root: &NodeHandle) -> TreeContents {
    fn walk(store: &InMemoryStore, node: &NodeHandle, prefix: &str, out: &mut TreeContents) {
        let attributes = store
            .attributes(node)
            .expect("Failed to read attributes")
            .into_iter()
            .map(|a| (a.name().to_string(), a))
            .collect();
        out.insert(prefix.to_string(), attributes);
        for child in store.children(node).expect("Failed to list children") {
            let key = format!("{prefix}/{}", child.name());
            walk(store, &child, &key, out);
        }
    }

    let mut out = TreeContents::new();
    walk(store, root, "", &mut out);
    out
}

/// A test harness for export/import round trips.
pub struct RoundTripHarness {
    /// The store documents are exported from.
    pub source: InMemoryStore,
    /// Rules used for both directions.
    pub rules: MappingRules,
}

impl RoundTripHarness {
    /// Creates a harness over an empty source store.
    pub fn new(rules: MappingRules) -> Self {
        Self::from_store(InMemoryStore::new(), rules)
    }

    /// Creates a harness over an existing source store.
    pub fn from_store(source: InMemoryStore, rules: MappingRules) -> Self {
        Self { source, rules }
    }

    /// Builds `tree` at `at`, creating missing ancestors.
    pub fn load(&mut self, at: &str, tree: &TreeSpec) -> NodeHandle {
        let target = path(at);
        let parent_path = target.parent().expect("Cannot load a tree at the root");
        let parent = ensure_path(&mut self.source, parent_path.as_str());
        build_tree(&mut self.source, &parent, target.name(), tree)
    }

    /// Exports the source subtree at `at`.
    pub fn export(&self, at: &str) -> String {
        export(&self.source, &node(&self.source, at), &self.rules).expect("Export failed")
    }

    /// Imports `text` into a fresh store at `at`.
    pub fn import_fresh(&self, at: &str, text: &str) -> (InMemoryStore, ImportReport) {
        let mut target = InMemoryStore::new();
        let parent = path(at).parent().expect("Cannot import at the root");
        ensure_path(&mut target, parent.as_str());
        let imported = import(text, &mut target, &path(at), &self.rules).expect("Import failed");
        (target, imported.report)
    }

    /// Exports `at`, imports the document into a fresh store and checks that
    /// the copy matches the source.
    ///
    /// Returns the copy.
    pub fn assert_round_trip(&self, at: &str) -> InMemoryStore {
        let text = self.export(at);
        let (target, report) = self.import_fresh(at, &text);
        assert!(report.is_clean(), "Import reported issues: {:?}", report.issues);

        let again = export(&target, &node(&target, at), &self.rules).expect("Export failed");
        assert_eq!(text, again, "Re-export differs");
        assert_eq!(
            contents(&self.source, &node(&self.source, at)),
            contents(&target, &node(&target, at)),
            "Tree contents differ"
        );
        target
    }

    /// Imports the export of `at` back onto itself and checks nothing
    /// changed.
    pub fn assert_reimport_is_noop(&mut self, at: &str) -> ImportReport {
        let before = contents(&self.source, &node(&self.source, at));
        let text = self.export(at);
        let imported =
            import(&text, &mut self.source, &path(at), &self.rules).expect("Import failed");
        assert!(imported.report.is_clean(), "{:?}", imported.report.issues);
        assert_eq!(imported.report.cleared, 0, "Attributes cleared");
        assert_eq!(imported.report.deleted, 0, "Children deleted");
        assert_eq!(
            before,
            contents(&self.source, &node(&self.source, at)),
            "Tree changed"
        );
        imported.report
    }
}

impl Default for RoundTripHarness {
    fn default() -> Self {
        Self::new(MappingRules::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scenarios;
    use treesync_codec::BinaryMode;
    use treesync_core::{ChangeRule, PropertyScope};

    #[test]
    fn site_round_trips_in_both_scopes() {
        for scope in [PropertyScope::Value, PropertyScope::Definition] {
            let rules = MappingRules::new()
                .with_scope(scope)
                .with_binary_mode(BinaryMode::Base64);
            RoundTripHarness::from_store(scenarios::site(), rules).assert_round_trip("/site");
        }
    }

    #[test]
    fn reimport_under_update_changes_nothing() {
        let rules = MappingRules::new()
            .with_binary_mode(BinaryMode::Base64)
            .with_change_rule(ChangeRule::Update);
        let mut harness = RoundTripHarness::from_store(scenarios::site(), rules);
        let report = harness.assert_reimport_is_noop("/site");
        assert_eq!(report.nodes_created, 0);
    }

    #[test]
    fn load_creates_ancestors() {
        let mut harness = RoundTripHarness::default();
        let mut spec = TreeSpec::default();
        spec.attributes.push(Attribute::single("a", "x"));
        spec.children.insert("nested".into(), TreeSpec::default());
        harness.load("/deep/under/tree", &spec);

        let tree = contents(&harness.source, &node(&harness.source, "/deep/under/tree"));
        assert_eq!(tree.len(), 2);
        assert!(tree[""].contains_key("a"));
        assert!(tree.contains_key("/nested"));
    }
}
