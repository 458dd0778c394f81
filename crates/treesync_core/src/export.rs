//! Tree export.
//!
//! Walks a node and its descendants and renders them as a JSON object.
//! Attributes come first, sorted by name; children follow in store order.
//!
//! In [`PropertyScope::Value`] each attribute is one member, with non-String
//! values carried as `{Type}text` strings:
//!
//! ```json
//! { "jcr:primaryType": "{Name}nt:unstructured", "count": "{Long}3", "title": "Hello" }
//! ```
//!
//! In [`PropertyScope::Definition`] the attributes are a `__properties__`
//! array of `{"name", "value", "type", "multi"}` descriptors. A node with an
//! attribute and a child of the same name is written this way in either
//! scope, since one object cannot hold both members.

use crate::error::SyncResult;
use crate::rules::{MappingRules, PropertyScope};
use crate::{CHILDREN_KEY, PROPERTIES_KEY, REFERENCE_KEY};
use serde_json::{Map, Value};
use treesync_codec::{
    binary_link, encode_tagged, to_text, Attribute, AttributeValue, BinaryMode, Scalar, TypeTag,
};
use treesync_store::{NodeHandle, NodeStore};

/// Exports `node` as JSON text.
///
/// The output is deterministic: exporting an unchanged tree twice yields the
/// same text.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
///
/// # Example
///
/// ```
/// use treesync_codec::Attribute;
/// use treesync_core::{export, MappingRules};
/// use treesync_store::{InMemoryStore, NodePath, NodeStore};
///
/// let mut store = InMemoryStore::new();
/// let root = store.resolve(&NodePath::root()).unwrap().unwrap();
/// let page = store.create_node(&root, "page", None).unwrap();
/// store.set_attribute(&page, Attribute::single("count", 3i64)).unwrap();
///
/// let text = export(&store, &page, &MappingRules::new().with_pretty(false)).unwrap();
/// assert_eq!(text, r#"{"count":"{Long}3","jcr:primaryType":"{Name}nt:unstructured"}"#);
/// ```
pub fn export<S: NodeStore + ?Sized>(
    store: &S,
    node: &NodeHandle,
    rules: &MappingRules,
) -> SyncResult<String> {
    let value = export_value(store, node, rules)?;
    let text = if rules.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

/// Exports `node` as a JSON value with member order preserved.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn export_value<S: NodeStore + ?Sized>(
    store: &S,
    node: &NodeHandle,
    rules: &MappingRules,
) -> SyncResult<Value> {
    let exporter = Exporter { store, rules };
    Ok(Value::Object(exporter.node_object(node, 0, true)?))
}

struct Exporter<'a, S: ?Sized> {
    store: &'a S,
    rules: &'a MappingRules,
}

impl<S: NodeStore + ?Sized> Exporter<'_, S> {
    fn node_object(
        &self,
        node: &NodeHandle,
        depth: usize,
        expand: bool,
    ) -> SyncResult<Map<String, Value>> {
        tracing::trace!(path = %node.path(), depth, "exporting node");
        let mut attributes: Vec<Attribute> = self
            .store
            .attributes(node)?
            .into_iter()
            .filter(|a| self.rules.export_attribute_filter.accept(a.name()))
            .collect();
        attributes.sort_by(|a, b| a.name().cmp(b.name()));

        let children: Vec<NodeHandle> = if self.rules.descends(depth) {
            self.store
                .children(node)?
                .into_iter()
                .filter(|child| self.rules.child_filter.accept(child))
                .collect()
        } else {
            Vec::new()
        };

        let mut object = Map::new();
        let values: Vec<(&str, Value)> = match self.rules.property_format.scope {
            PropertyScope::Value => attributes
                .iter()
                .filter_map(|a| self.compact(node, a).map(|value| (a.name(), value)))
                .collect(),
            PropertyScope::Definition => Vec::new(),
        };
        // An attribute and a child can share a name; only descriptors keep both.
        let shadowed = values
            .iter()
            .any(|(name, _)| children.iter().any(|child| child.name() == *name));
        if self.rules.property_format.scope == PropertyScope::Definition || shadowed {
            if shadowed {
                tracing::debug!(
                    path = %node.path(),
                    "attribute and child share a name, using descriptors"
                );
            }
            let descriptors: Vec<Value> = attributes
                .iter()
                .filter_map(|attribute| self.descriptor(node, attribute))
                .collect();
            object.insert(PROPERTIES_KEY.to_string(), Value::Array(descriptors));
        } else {
            for (name, value) in values {
                object.insert(name.to_string(), value);
            }
        }

        let has_children = !children.is_empty();
        for child in &children {
            let value = self.node_object(child, depth + 1, expand)?;
            object.insert(child.name().to_string(), Value::Object(value));
        }

        if !has_children && expand && self.rules.expand_references && self.rules.descends(depth) {
            if let Some((target, content)) = self.referenced_content(&attributes)? {
                let mut view = Map::new();
                view.insert(REFERENCE_KEY.to_string(), Value::String(target));
                let value = self.node_object(&content, depth + 1, false)?;
                view.insert(content.name().to_string(), Value::Object(value));
                object.insert(CHILDREN_KEY.to_string(), Value::Object(view));
            }
        }
        Ok(object)
    }

    /// Finds the content node shown for a node whose only link to the rest
    /// of the tree is a single Reference attribute.
    fn referenced_content(
        &self,
        attributes: &[Attribute],
    ) -> SyncResult<Option<(String, NodeHandle)>> {
        let mut references = attributes.iter().filter_map(|a| match a.value() {
            AttributeValue::Single(Scalar::Reference(target)) => Some(target),
            _ => None,
        });
        let (Some(target), None) = (references.next(), references.next()) else {
            return Ok(None);
        };
        let Some(node) = self.store.resolve_reference(target)? else {
            tracing::debug!(reference = %target, "reference target not found");
            return Ok(None);
        };
        if node.name() == self.rules.content_node_name {
            return Ok(Some((target.clone(), node)));
        }
        let content = node.path().child(&self.rules.content_node_name)?;
        Ok(self
            .store
            .resolve(&content)?
            .map(|content| (target.clone(), content)))
    }

    fn binary_mode(&self) -> BinaryMode {
        self.rules.property_format.binary_mode
    }

    fn link(&self, node: &NodeHandle, name: &str) -> String {
        binary_link(&self.rules.link_prefix, node.path().as_str(), name)
    }

    /// Compact member value, or `None` for a skipped binary.
    fn compact(&self, node: &NodeHandle, attribute: &Attribute) -> Option<Value> {
        if attribute.tag() == TypeTag::Binary && self.binary_mode() == BinaryMode::Skip {
            return None;
        }
        let encode = |scalar: &Scalar| -> Value {
            match (scalar, self.binary_mode()) {
                (Scalar::Binary(_), BinaryMode::Link) => Value::String(format!(
                    "{{{}}}{}",
                    TypeTag::Binary,
                    self.link(node, attribute.name())
                )),
                _ => Value::String(encode_tagged(scalar)),
            }
        };
        Some(match attribute.value() {
            AttributeValue::Single(scalar) => encode(scalar),
            AttributeValue::Multi { values, .. } => {
                Value::Array(values.iter().map(encode).collect())
            }
        })
    }

    /// Descriptor object, or `None` for a skipped binary.
    fn descriptor(&self, node: &NodeHandle, attribute: &Attribute) -> Option<Value> {
        let tag = attribute.tag();
        if tag == TypeTag::Binary && self.binary_mode() == BinaryMode::Skip {
            return None;
        }
        let encode = |scalar: &Scalar| -> Value {
            match scalar {
                Scalar::Boolean(b) => Value::Bool(*b),
                Scalar::Long(n) => Value::from(*n),
                Scalar::Binary(_) if self.binary_mode() == BinaryMode::Link => {
                    Value::String(self.link(node, attribute.name()))
                }
                other => Value::String(to_text(other)),
            }
        };
        let value = match attribute.value() {
            AttributeValue::Single(scalar) => encode(scalar),
            AttributeValue::Multi { values, .. } => {
                Value::Array(values.iter().map(encode).collect())
            }
        };

        let mut descriptor = Map::new();
        descriptor.insert("name".into(), Value::String(attribute.name().to_string()));
        descriptor.insert("value".into(), value);
        descriptor.insert("type".into(), Value::String(tag.to_string()));
        descriptor.insert("multi".into(), Value::Bool(attribute.arity().is_multi()));
        Some(Value::Object(descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use treesync_store::{InMemoryStore, NodePath};

    fn store_with_page() -> (InMemoryStore, NodeHandle) {
        let mut store = InMemoryStore::new();
        let root = store.resolve(&NodePath::root()).unwrap().unwrap();
        let page = store.create_node(&root, "page", None).unwrap();
        store
            .set_attribute(&page, Attribute::single("title", "Hello"))
            .unwrap();
        store
            .set_attribute(&page, Attribute::single("count", 3i64))
            .unwrap();
        store
            .set_attribute(&page, Attribute::single("flag", true))
            .unwrap();
        (store, page)
    }

    #[test]
    fn value_scope_sorts_and_tags() {
        let (store, page) = store_with_page();
        let value = export_value(&store, &page, &MappingRules::new()).unwrap();
        assert_eq!(
            value,
            json!({
                "count": "{Long}3",
                "flag": "{Boolean}true",
                "jcr:primaryType": "{Name}nt:unstructured",
                "title": "Hello",
            })
        );
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["count", "flag", "jcr:primaryType", "title"]);
    }

    #[test]
    fn definition_scope_uses_descriptors() {
        let (mut store, page) = store_with_page();
        store.create_node(&page, "child", None).unwrap();
        let rules = MappingRules::new().with_scope(PropertyScope::Definition);
        let value = export_value(&store, &page, &rules).unwrap();
        let object = value.as_object().unwrap();

        let keys: Vec<_> = object.keys().cloned().collect();
        assert_eq!(keys, vec![PROPERTIES_KEY, "child"]);
        assert_eq!(
            object[PROPERTIES_KEY][0],
            json!({"name": "count", "value": 3, "type": "Long", "multi": false})
        );
        assert_eq!(
            object[PROPERTIES_KEY][1],
            json!({"name": "flag", "value": true, "type": "Boolean", "multi": false})
        );
        assert_eq!(
            object[PROPERTIES_KEY][3],
            json!({"name": "title", "value": "Hello", "type": "String", "multi": false})
        );
    }

    #[test]
    fn multi_values_are_arrays() {
        let (mut store, page) = store_with_page();
        let tags = Attribute::multi("tags", TypeTag::String, vec!["a".into(), "b".into()]).unwrap();
        let sizes = Attribute::multi("sizes", TypeTag::Long, vec![1i64.into(), 2i64.into()]).unwrap();
        let empty = Attribute::multi("none", TypeTag::String, vec![]).unwrap();
        store.set_attribute(&page, tags).unwrap();
        store.set_attribute(&page, sizes).unwrap();
        store.set_attribute(&page, empty).unwrap();

        let value = export_value(&store, &page, &MappingRules::new()).unwrap();
        assert_eq!(value["tags"], json!(["a", "b"]));
        assert_eq!(value["sizes"], json!(["{Long}1", "{Long}2"]));
        assert_eq!(value["none"], json!([]));
    }

    #[test]
    fn depth_limit_stops_descent() {
        let (mut store, page) = store_with_page();
        let a = store.create_node(&page, "a", None).unwrap();
        store.create_node(&a, "b", None).unwrap();

        let rules = MappingRules::new().with_max_depth(1);
        let value = export_value(&store, &page, &rules).unwrap();
        assert!(value["a"].is_object());
        assert!(value["a"].get("b").is_none());
        assert_eq!(value["a"]["jcr:primaryType"], "{Name}nt:unstructured");

        let unlimited = export_value(&store, &page, &MappingRules::new()).unwrap();
        assert!(unlimited["a"]["b"].is_object());
    }

    #[test]
    fn filters_apply() {
        let (mut store, page) = store_with_page();
        store.create_node(&page, "visible", None).unwrap();
        store.create_node(&page, "hidden", None).unwrap();
        let rules = MappingRules::new()
            .with_child_filter(|node: &NodeHandle| node.name() != "hidden")
            .with_export_filter(|name: &str| name != "count");
        let value = export_value(&store, &page, &rules).unwrap();
        assert!(value.get("visible").is_some());
        assert!(value.get("hidden").is_none());
        assert!(value.get("count").is_none());
        assert!(value.get("title").is_some());
    }

    #[test]
    fn binary_modes() {
        let (mut store, page) = store_with_page();
        store
            .set_attribute(&page, Attribute::single("data", vec![1u8, 2, 3]))
            .unwrap();

        let skip = export_value(&store, &page, &MappingRules::new()).unwrap();
        assert!(skip.get("data").is_none());

        let base64 = MappingRules::new().with_binary_mode(BinaryMode::Base64);
        let value = export_value(&store, &page, &base64).unwrap();
        assert_eq!(value["data"], "{Binary}AQID");

        let link = MappingRules::new()
            .with_binary_mode(BinaryMode::Link)
            .with_link_prefix("http://host");
        let value = export_value(&store, &page, &link).unwrap();
        assert_eq!(value["data"], "{Binary}http://host/page/data");

        let definition = link.with_scope(PropertyScope::Definition);
        let value = export_value(&store, &page, &definition).unwrap();
        let descriptors = value[PROPERTIES_KEY].as_array().unwrap();
        let data = descriptors.iter().find(|d| d["name"] == "data").unwrap();
        assert_eq!(data["value"], "http://host/page/data");
        assert_eq!(data["type"], "Binary");
    }

    #[test]
    fn ambiguous_strings_get_explicit_tag() {
        let (mut store, page) = store_with_page();
        store
            .set_attribute(&page, Attribute::single("note", "{Long}7"))
            .unwrap();
        let value = export_value(&store, &page, &MappingRules::new()).unwrap();
        assert_eq!(value["note"], "{String}{Long}7");
    }

    #[test]
    fn references_are_expanded() {
        let mut store = InMemoryStore::new();
        let root = store.resolve(&NodePath::root()).unwrap().unwrap();
        let asset = store.create_node(&root, "asset", None).unwrap();
        let content = store.create_node(&asset, "jcr:content", None).unwrap();
        store
            .set_attribute(&content, Attribute::single("mime", "text/plain"))
            .unwrap();
        let link = store.create_node(&root, "link", None).unwrap();
        store
            .set_attribute(&link, Attribute::single("target", Scalar::Reference("/asset".into())))
            .unwrap();

        let value = export_value(&store, &link, &MappingRules::new()).unwrap();
        let view = value[CHILDREN_KEY].as_object().unwrap();
        let keys: Vec<_> = view.keys().cloned().collect();
        assert_eq!(keys, vec![REFERENCE_KEY, "jcr:content"]);
        assert_eq!(view[REFERENCE_KEY], "/asset");
        assert_eq!(view["jcr:content"]["mime"], "text/plain");

        let off = MappingRules::new().with_reference_expansion(false);
        let value = export_value(&store, &link, &off).unwrap();
        assert!(value.get(CHILDREN_KEY).is_none());
    }

    #[test]
    fn no_expansion_with_real_children_or_two_references() {
        let mut store = InMemoryStore::new();
        let root = store.resolve(&NodePath::root()).unwrap().unwrap();
        let asset = store.create_node(&root, "asset", None).unwrap();
        store.create_node(&asset, "jcr:content", None).unwrap();
        let link = store.create_node(&root, "link", None).unwrap();
        let reference = Scalar::Reference("/asset".into());
        store
            .set_attribute(&link, Attribute::single("a", reference.clone()))
            .unwrap();
        store
            .set_attribute(&link, Attribute::single("b", reference))
            .unwrap();
        let value = export_value(&store, &link, &MappingRules::new()).unwrap();
        assert!(value.get(CHILDREN_KEY).is_none());

        store.clear_attribute(&link, "b").unwrap();
        store.create_node(&link, "own", None).unwrap();
        let value = export_value(&store, &link, &MappingRules::new()).unwrap();
        assert!(value.get(CHILDREN_KEY).is_none());
    }

    #[test]
    fn shared_names_fall_back_to_descriptors() {
        let (mut store, page) = store_with_page();
        store.create_node(&page, "title", None).unwrap();
        let value = export_value(&store, &page, &MappingRules::new()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object["title"], json!({"jcr:primaryType": "{Name}nt:unstructured"}));
        let names: Vec<&str> = object[PROPERTIES_KEY]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["count", "flag", "jcr:primaryType", "title"]);
        assert!(!object.contains_key("count"));
    }

    #[test]
    fn export_is_deterministic() {
        let (mut store, page) = store_with_page();
        store.create_node(&page, "z", None).unwrap();
        store.create_node(&page, "a", None).unwrap();
        let rules = MappingRules::new();
        let first = export(&store, &page, &rules).unwrap();
        let second = export(&store, &page, &rules).unwrap();
        assert_eq!(first, second);
        assert!(first.contains('\n'));

        let compact = export(&store, &page, &rules.with_pretty(false)).unwrap();
        assert!(!compact.contains('\n'));
    }
}
