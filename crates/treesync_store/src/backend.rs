//! Node store trait definition.

use crate::error::StoreResult;
use crate::path::NodePath;
use treesync_codec::Attribute;

/// Name of the attribute holding a node's primary type.
pub const PRIMARY_TYPE: &str = "jcr:primaryType";

/// Name of the attribute holding a node's secondary (mixin) types.
pub const MIXIN_TYPES: &str = "jcr:mixinTypes";

/// Type given to nodes created without a type hint.
pub const DEFAULT_NODE_TYPE: &str = "nt:unstructured";

/// A reference to a node in a store.
///
/// Handles are plain values: they carry the node's path and primary type as
/// seen when the handle was produced. They do not keep the node alive and
/// are only meaningful against the store that returned them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    path: NodePath,
    primary_type: String,
}

impl NodeHandle {
    /// Creates a handle.
    pub fn new(path: NodePath, primary_type: impl Into<String>) -> Self {
        Self {
            path,
            primary_type: primary_type.into(),
        }
    }

    /// The node's path.
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// The node's local name; empty for the root.
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// The node's primary type.
    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }
}

/// A hierarchical store of typed attributes.
///
/// The store is the unit of work for one export or import: the engine reads
/// and writes through it and never commits or rolls back. Implementations
/// enforce their own node type rules and report violations as errors.
///
/// # Invariants
///
/// - `attributes` includes the primary type attribute
/// - `set_attribute` rejects a write whose arity differs from the stored
///   attribute with [`StoreError::ArityMismatch`](crate::StoreError::ArityMismatch)
/// - `clear_attribute` of an absent attribute succeeds
/// - `delete_node` removes the whole subtree
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - Reference implementation and test double
pub trait NodeStore: Send + Sync {
    /// Looks up the node at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn resolve(&self, path: &NodePath) -> StoreResult<Option<NodeHandle>>;

    /// Creates the child `name` of `parent`.
    ///
    /// A `type_hint` of `None` creates the node with the store's default
    /// type.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent does not exist, the child exists, the
    /// type is unknown, or the parent's type does not allow children.
    fn create_node(
        &mut self,
        parent: &NodeHandle,
        name: &str,
        type_hint: Option<&str>,
    ) -> StoreResult<NodeHandle>;

    /// Returns the children of `node` in store order.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist.
    fn children(&self, node: &NodeHandle) -> StoreResult<Vec<NodeHandle>>;

    /// Returns the attribute `name` of `node`, if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist.
    fn attribute(&self, node: &NodeHandle, name: &str) -> StoreResult<Option<Attribute>>;

    /// Returns every attribute of `node`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist.
    fn attributes(&self, node: &NodeHandle) -> StoreResult<Vec<Attribute>>;

    /// Writes an attribute, replacing any existing value of the same arity.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist, the arity differs from
    /// the stored value, or the node's type forbids the attribute.
    fn set_attribute(&mut self, node: &NodeHandle, attribute: Attribute) -> StoreResult<()>;

    /// Removes the attribute `name` from `node`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or the attribute is
    /// protected.
    fn clear_attribute(&mut self, node: &NodeHandle, name: &str) -> StoreResult<()>;

    /// Deletes `node` and everything below it.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist or cannot be removed.
    fn delete_node(&mut self, node: &NodeHandle) -> StoreResult<()>;

    /// Resolves the target of a Reference or WeakReference value.
    ///
    /// The default treats the reference text as a node path.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn resolve_reference(&self, reference: &str) -> StoreResult<Option<NodeHandle>> {
        match NodePath::parse(reference) {
            Ok(path) => self.resolve(&path),
            Err(_) => Ok(None),
        }
    }
}
