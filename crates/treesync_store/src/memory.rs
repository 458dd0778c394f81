//! In-memory node store.

use crate::backend::{NodeHandle, NodeStore, DEFAULT_NODE_TYPE, MIXIN_TYPES, PRIMARY_TYPE};
use crate::error::{StoreError, StoreResult};
use crate::node_type::{NodeType, NodeTypeRegistry};
use crate::path::{is_reserved, NodePath};
use crate::snapshot::{NodeRecord, StoreSnapshot};
use parking_lot::RwLock;
use treesync_codec::{Arity, Attribute, Scalar, TypeTag};

/// An in-memory node store.
///
/// This store keeps the whole tree in memory and enforces the node type
/// rules of its [`NodeTypeRegistry`]:
/// - `jcr:primaryType` is protected and only set through node creation
/// - attributes must be permitted by the primary type or a mixin
/// - `jcr:mixinTypes` may only name registered mixin types
/// - writes never silently change an attribute's arity
/// - nodes and attributes never use a [`RESERVED_NAMES`](crate::RESERVED_NAMES) entry
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use treesync_codec::Attribute;
/// use treesync_store::{InMemoryStore, NodePath, NodeStore};
///
/// let mut store = InMemoryStore::new();
/// let root = store.resolve(&NodePath::root()).unwrap().unwrap();
/// let page = store.create_node(&root, "page", None).unwrap();
/// store.set_attribute(&page, Attribute::single("title", "Hello")).unwrap();
/// assert_eq!(store.children(&root).unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreSnapshot>,
}

impl InMemoryStore {
    /// Creates a store holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the given node types and only the root node.
    #[must_use]
    pub fn with_types(types: NodeTypeRegistry) -> Self {
        let mut snapshot = StoreSnapshot::default();
        snapshot.types = types;
        Self::from_snapshot(snapshot)
    }

    /// Creates a store holding the contents of a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Returns a copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.read().clone()
    }

    /// Replaces the contents with a snapshot.
    pub fn restore(&self, snapshot: StoreSnapshot) {
        *self.state.write() = snapshot;
    }

    /// Adds or replaces a node type.
    pub fn register_type(&self, node_type: NodeType) {
        self.state.write().types.register(node_type);
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    fn handle(path: &NodePath, record: &NodeRecord) -> NodeHandle {
        NodeHandle::new(path.clone(), record.primary_type.clone())
    }
}

fn record<'a>(state: &'a StoreSnapshot, path: &NodePath) -> StoreResult<&'a NodeRecord> {
    state
        .nodes
        .get(path.as_str())
        .ok_or_else(|| StoreError::not_found(path))
}

fn mixins(record: &NodeRecord) -> Vec<String> {
    record
        .attributes
        .iter()
        .find(|a| a.name() == MIXIN_TYPES)
        .map(|a| {
            a.value()
                .scalars()
                .iter()
                .filter_map(Scalar::as_text)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn primary_type_attribute(record: &NodeRecord) -> Attribute {
    Attribute::single(PRIMARY_TYPE, Scalar::Name(record.primary_type.clone()))
}

fn arity_name(arity: Arity) -> &'static str {
    match arity {
        Arity::Single => "single-valued",
        Arity::Multi => "multi-valued",
    }
}

impl NodeStore for InMemoryStore {
    fn resolve(&self, path: &NodePath) -> StoreResult<Option<NodeHandle>> {
        let state = self.state.read();
        Ok(state
            .nodes
            .get(path.as_str())
            .map(|record| Self::handle(path, record)))
    }

    fn create_node(
        &mut self,
        parent: &NodeHandle,
        name: &str,
        type_hint: Option<&str>,
    ) -> StoreResult<NodeHandle> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let child_path = parent.path().child(name)?;
        let parent_record = record(state, parent.path())?;
        if state.nodes.contains_key(child_path.as_str()) {
            return Err(StoreError::AlreadyExists {
                path: child_path.to_string(),
            });
        }

        let type_name = type_hint.unwrap_or(DEFAULT_NODE_TYPE);
        match state.types.get(type_name) {
            Some(t) if !t.mixin => {}
            _ => {
                return Err(StoreError::UnknownNodeType {
                    name: type_name.to_string(),
                })
            }
        }
        let parent_allows = state
            .types
            .get(&parent_record.primary_type)
            .map_or(true, |t| t.allows_children);
        if !parent_allows {
            return Err(StoreError::constraint(
                parent.path(),
                format!("{} does not allow child nodes", parent_record.primary_type),
            ));
        }

        state
            .nodes
            .insert(child_path.to_string(), NodeRecord::new(type_name));
        if let Some(parent_record) = state.nodes.get_mut(parent.path().as_str()) {
            parent_record.children.push(name.to_string());
        }
        tracing::trace!(path = %child_path, node_type = type_name, "node created");
        Ok(NodeHandle::new(child_path, type_name))
    }

    fn children(&self, node: &NodeHandle) -> StoreResult<Vec<NodeHandle>> {
        let state = self.state.read();
        let parent = record(&state, node.path())?;
        parent
            .children
            .iter()
            .map(|name| {
                let path = node.path().child(name)?;
                let child = record(&state, &path)?;
                Ok(Self::handle(&path, child))
            })
            .collect()
    }

    fn attribute(&self, node: &NodeHandle, name: &str) -> StoreResult<Option<Attribute>> {
        let state = self.state.read();
        let record = record(&state, node.path())?;
        if name == PRIMARY_TYPE {
            return Ok(Some(primary_type_attribute(record)));
        }
        Ok(record.attributes.iter().find(|a| a.name() == name).cloned())
    }

    fn attributes(&self, node: &NodeHandle) -> StoreResult<Vec<Attribute>> {
        let state = self.state.read();
        let record = record(&state, node.path())?;
        let mut attributes = Vec::with_capacity(record.attributes.len() + 1);
        attributes.push(primary_type_attribute(record));
        attributes.extend(record.attributes.iter().cloned());
        Ok(attributes)
    }

    fn set_attribute(&mut self, node: &NodeHandle, attribute: Attribute) -> StoreResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let path = node.path();
        let name = attribute.name();

        if name == PRIMARY_TYPE {
            return Err(StoreError::constraint(path, "jcr:primaryType is protected"));
        }
        if is_reserved(name) {
            return Err(StoreError::constraint(path, format!("{name} is a reserved name")));
        }
        let current = record(state, path)?;

        if name == MIXIN_TYPES {
            if attribute.arity() != Arity::Multi
                || !matches!(attribute.tag(), TypeTag::Name | TypeTag::String)
            {
                return Err(StoreError::constraint(
                    path,
                    "jcr:mixinTypes must be a multi-valued name",
                ));
            }
            for mixin in attribute.value().scalars().iter().filter_map(Scalar::as_text) {
                if !state.types.get(mixin).is_some_and(|t| t.mixin) {
                    return Err(StoreError::UnknownNodeType {
                        name: mixin.to_string(),
                    });
                }
            }
        } else if !state
            .types
            .permits(&current.primary_type, &mixins(current), name)
        {
            return Err(StoreError::constraint(
                path,
                format!("{} does not permit attribute {name}", current.primary_type),
            ));
        }

        if let Some(existing) = current.attributes.iter().find(|a| a.name() == name) {
            if existing.arity() != attribute.arity() {
                return Err(StoreError::ArityMismatch {
                    path: path.to_string(),
                    name: name.to_string(),
                    existing: arity_name(existing.arity()),
                    attempted: arity_name(attribute.arity()),
                });
            }
        }

        let record = state
            .nodes
            .get_mut(path.as_str())
            .ok_or_else(|| StoreError::not_found(path))?;
        match record.attributes.iter_mut().find(|a| a.name() == attribute.name()) {
            Some(slot) => *slot = attribute,
            None => record.attributes.push(attribute),
        }
        Ok(())
    }

    fn clear_attribute(&mut self, node: &NodeHandle, name: &str) -> StoreResult<()> {
        let mut state = self.state.write();
        if name == PRIMARY_TYPE {
            return Err(StoreError::constraint(
                node.path(),
                "jcr:primaryType is protected",
            ));
        }
        let record = state
            .nodes
            .get_mut(node.path().as_str())
            .ok_or_else(|| StoreError::not_found(node.path()))?;
        record.attributes.retain(|a| a.name() != name);
        Ok(())
    }

    fn delete_node(&mut self, node: &NodeHandle) -> StoreResult<()> {
        let mut state = self.state.write();
        let path = node.path();
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::constraint(path, "the root node cannot be deleted"))?;
        if !state.nodes.contains_key(path.as_str()) {
            return Err(StoreError::not_found(path));
        }

        let prefix = format!("{path}/");
        let before = state.nodes.len();
        state
            .nodes
            .retain(|key, _| key != path.as_str() && !key.starts_with(&prefix));
        if let Some(parent_record) = state.nodes.get_mut(parent.as_str()) {
            parent_record.children.retain(|c| c != path.name());
        }
        tracing::trace!(%path, removed = before - state.nodes.len(), "node deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(store: &InMemoryStore) -> NodeHandle {
        store.resolve(&NodePath::root()).unwrap().unwrap()
    }

    #[test]
    fn new_store_has_root() {
        let store = InMemoryStore::new();
        let root = root(&store);
        assert!(root.path().is_root());
        assert_eq!(root.primary_type(), DEFAULT_NODE_TYPE);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn reserved_names_are_refused() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let page = store.create_node(&root, "page", None).unwrap();
        for name in crate::RESERVED_NAMES {
            let err = store
                .set_attribute(&page, Attribute::single(name, "keep me"))
                .unwrap_err();
            assert!(matches!(err, StoreError::ConstraintViolation { .. }), "{name}");
            assert!(store.create_node(&page, name, None).is_err(), "{name}");
        }
        assert_eq!(store.attributes(&page).unwrap().len(), 1);
        assert!(store.children(&page).unwrap().is_empty());
    }

    #[test]
    fn create_and_resolve() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let folder = store.create_node(&root, "docs", Some("nt:folder")).unwrap();
        assert_eq!(folder.path().as_str(), "/docs");
        assert_eq!(folder.primary_type(), "nt:folder");

        let resolved = store
            .resolve(&NodePath::parse("/docs").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(resolved, folder);
    }

    #[test]
    fn create_rejects_duplicates_and_unknown_types() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        store.create_node(&root, "a", None).unwrap();
        assert!(matches!(
            store.create_node(&root, "a", None),
            Err(StoreError::AlreadyExists { .. })
        ));
        assert!(matches!(
            store.create_node(&root, "b", Some("x:nothing")),
            Err(StoreError::UnknownNodeType { .. })
        ));
        assert!(matches!(
            store.create_node(&root, "c", Some("mix:title")),
            Err(StoreError::UnknownNodeType { .. })
        ));
    }

    #[test]
    fn leaf_types_refuse_children() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let res = store.create_node(&root, "res", Some("nt:resource")).unwrap();
        assert!(matches!(
            store.create_node(&res, "child", None),
            Err(StoreError::ConstraintViolation { .. })
        ));
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        for name in ["zeta", "alpha", "mid"] {
            store.create_node(&root, name, None).unwrap();
        }
        let names: Vec<_> = store
            .children(&root)
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn attributes_include_primary_type_first() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let node = store.create_node(&root, "n", None).unwrap();
        store
            .set_attribute(&node, Attribute::single("title", "Hi"))
            .unwrap();
        let attributes = store.attributes(&node).unwrap();
        assert_eq!(attributes[0].name(), PRIMARY_TYPE);
        assert_eq!(
            attributes[0].as_single(),
            Some(&Scalar::Name(DEFAULT_NODE_TYPE.into()))
        );
        assert_eq!(attributes[1].name(), "title");
    }

    #[test]
    fn set_replaces_in_place() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let node = store.create_node(&root, "n", None).unwrap();
        store.set_attribute(&node, Attribute::single("a", "1")).unwrap();
        store.set_attribute(&node, Attribute::single("b", "2")).unwrap();
        store.set_attribute(&node, Attribute::single("a", 3i64)).unwrap();
        let attributes = store.attributes(&node).unwrap();
        let names: Vec<_> = attributes.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec![PRIMARY_TYPE, "a", "b"]);
        assert_eq!(
            store.attribute(&node, "a").unwrap().unwrap().as_single(),
            Some(&Scalar::Long(3))
        );
    }

    #[test]
    fn arity_changes_are_rejected() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let node = store.create_node(&root, "n", None).unwrap();
        store.set_attribute(&node, Attribute::single("x", "a")).unwrap();
        let multi = Attribute::multi("x", TypeTag::String, vec!["a".into(), "b".into()]).unwrap();
        let err = store.set_attribute(&node, multi.clone()).unwrap_err();
        assert!(err.is_arity_mismatch());

        store.clear_attribute(&node, "x").unwrap();
        store.set_attribute(&node, multi).unwrap();
        assert_eq!(
            store.attribute(&node, "x").unwrap().unwrap().arity(),
            Arity::Multi
        );
    }

    #[test]
    fn primary_type_is_protected() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let node = store.create_node(&root, "n", None).unwrap();
        assert!(matches!(
            store.set_attribute(&node, Attribute::single(PRIMARY_TYPE, "nt:folder")),
            Err(StoreError::ConstraintViolation { .. })
        ));
        assert!(matches!(
            store.clear_attribute(&node, PRIMARY_TYPE),
            Err(StoreError::ConstraintViolation { .. })
        ));
    }

    #[test]
    fn structured_types_need_mixins_for_extra_attributes() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let folder = store.create_node(&root, "f", Some("nt:folder")).unwrap();
        assert!(matches!(
            store.set_attribute(&folder, Attribute::single("jcr:title", "T")),
            Err(StoreError::ConstraintViolation { .. })
        ));

        let mixins =
            Attribute::multi(MIXIN_TYPES, TypeTag::Name, vec![Scalar::Name("mix:title".into())])
                .unwrap();
        store.set_attribute(&folder, mixins).unwrap();
        store
            .set_attribute(&folder, Attribute::single("jcr:title", "T"))
            .unwrap();
    }

    #[test]
    fn unknown_mixins_are_rejected() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let node = store.create_node(&root, "n", None).unwrap();
        let mixins =
            Attribute::multi(MIXIN_TYPES, TypeTag::Name, vec![Scalar::Name("mix:nope".into())])
                .unwrap();
        assert!(matches!(
            store.set_attribute(&node, mixins),
            Err(StoreError::UnknownNodeType { .. })
        ));
    }

    #[test]
    fn delete_removes_subtree() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let a = store.create_node(&root, "a", None).unwrap();
        let b = store.create_node(&a, "b", None).unwrap();
        store.create_node(&b, "c", None).unwrap();
        let ab = store.create_node(&root, "ab", None).unwrap();

        store.delete_node(&a).unwrap();
        assert_eq!(store.node_count(), 2);
        assert!(store.resolve(ab.path()).unwrap().is_some());
        assert_eq!(store.children(&root).unwrap(), vec![ab]);
        store.snapshot().validate().unwrap();
    }

    #[test]
    fn root_cannot_be_deleted() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        assert!(store.delete_node(&root).is_err());
    }

    #[test]
    fn missing_nodes_are_not_found() {
        let mut store = InMemoryStore::new();
        let ghost = NodeHandle::new(NodePath::parse("/ghost").unwrap(), DEFAULT_NODE_TYPE);
        assert!(matches!(
            store.attributes(&ghost),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.set_attribute(&ghost, Attribute::single("a", "b")),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete_node(&ghost),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn references_resolve_as_paths() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let target = store.create_node(&root, "target", None).unwrap();
        assert_eq!(store.resolve_reference("/target").unwrap(), Some(target));
        assert_eq!(store.resolve_reference("not-a-path").unwrap(), None);
        assert_eq!(store.resolve_reference("/missing").unwrap(), None);
    }

    #[test]
    fn snapshot_and_restore() {
        let mut store = InMemoryStore::new();
        let root = root(&store);
        let saved = store.snapshot();
        store.create_node(&root, "temp", None).unwrap();
        assert_eq!(store.node_count(), 2);
        store.restore(saved);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn custom_types() {
        let store = InMemoryStore::with_types(NodeTypeRegistry::default());
        store.register_type(NodeType::structured("app:leaf", &["value"], false));
        let mut store = store;
        let root = root(&store);
        let leaf = store.create_node(&root, "leaf", Some("app:leaf")).unwrap();
        store.set_attribute(&leaf, Attribute::single("value", 1i64)).unwrap();
        assert!(store.set_attribute(&leaf, Attribute::single("other", 1i64)).is_err());
    }
}
