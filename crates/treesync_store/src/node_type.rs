//! Node type definitions.

use crate::backend::{DEFAULT_NODE_TYPE, MIXIN_TYPES, PRIMARY_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The rules a node type imposes on its nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    /// Type name, e.g. `nt:folder`.
    pub name: String,
    /// Whether this is a mixin (secondary) type.
    pub mixin: bool,
    /// Whether any attribute name is allowed.
    pub residual: bool,
    /// Attribute names allowed when not residual.
    pub attributes: Vec<String>,
    /// Whether nodes of this type may have children.
    pub allows_children: bool,
}

impl NodeType {
    /// A primary type accepting any attribute and any child.
    pub fn unstructured(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mixin: false,
            residual: true,
            attributes: Vec::new(),
            allows_children: true,
        }
    }

    /// A primary type accepting only the listed attributes.
    pub fn structured(name: impl Into<String>, attributes: &[&str], allows_children: bool) -> Self {
        Self {
            name: name.into(),
            mixin: false,
            residual: false,
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
            allows_children,
        }
    }

    /// A mixin type contributing the listed attributes.
    pub fn mixin(name: impl Into<String>, attributes: &[&str]) -> Self {
        Self {
            name: name.into(),
            mixin: true,
            residual: false,
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
            allows_children: true,
        }
    }

    /// Returns true if this type alone permits an attribute named `name`.
    pub fn permits(&self, name: &str) -> bool {
        self.residual || self.attributes.iter().any(|a| a == name)
    }
}

/// The set of node types a store knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeRegistry {
    types: BTreeMap<String, NodeType>,
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(NodeType::unstructured(DEFAULT_NODE_TYPE));
        registry.register(NodeType::structured(
            "nt:folder",
            &["jcr:created", "jcr:createdBy"],
            true,
        ));
        registry.register(NodeType::structured(
            "nt:file",
            &["jcr:created", "jcr:createdBy"],
            true,
        ));
        registry.register(NodeType::structured(
            "nt:resource",
            &[
                "jcr:data",
                "jcr:mimeType",
                "jcr:encoding",
                "jcr:lastModified",
                "jcr:lastModifiedBy",
            ],
            false,
        ));
        registry.register(NodeType::mixin("mix:title", &["jcr:title", "jcr:description"]));
        registry.register(NodeType::mixin("mix:referenceable", &["jcr:uuid"]));
        registry
    }
}

impl NodeTypeRegistry {
    /// A registry with no types at all.
    pub fn empty() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// Adds or replaces a type.
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.name.clone(), node_type);
    }

    /// Looks up a type by name.
    pub fn get(&self, name: &str) -> Option<&NodeType> {
        self.types.get(name)
    }

    /// Returns true if a node of `primary` with the given mixins may carry
    /// the attribute `name`.
    ///
    /// The type attributes themselves are always permitted. Unknown type
    /// names permit nothing beyond that.
    pub fn permits(&self, primary: &str, mixins: &[String], name: &str) -> bool {
        if name == PRIMARY_TYPE || name == MIXIN_TYPES {
            return true;
        }
        let by_primary = self.get(primary).is_some_and(|t| t.permits(name));
        by_primary
            || mixins
                .iter()
                .filter_map(|m| self.get(m))
                .any(|t| t.permits(name))
    }

    /// Iterates over all registered types.
    pub fn iter(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_types() {
        let registry = NodeTypeRegistry::default();
        assert!(registry.get(DEFAULT_NODE_TYPE).unwrap().residual);
        assert!(registry.get("mix:title").unwrap().mixin);
        assert!(!registry.get("nt:resource").unwrap().allows_children);
    }

    #[test]
    fn mixins_extend_permitted_attributes() {
        let registry = NodeTypeRegistry::default();
        assert!(!registry.permits("nt:folder", &[], "jcr:title"));
        assert!(registry.permits("nt:folder", &["mix:title".to_string()], "jcr:title"));
        assert!(registry.permits("nt:folder", &[], "jcr:created"));
        assert!(registry.permits("nt:folder", &[], PRIMARY_TYPE));
        assert!(registry.permits("nt:unstructured", &[], "anything"));
    }

    #[test]
    fn unknown_types_permit_nothing() {
        let registry = NodeTypeRegistry::default();
        assert!(!registry.permits("x:unknown", &[], "title"));
        assert!(registry.permits("x:unknown", &[], MIXIN_TYPES));
    }
}
