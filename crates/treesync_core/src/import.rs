//! Tree import.
//!
//! The document is parsed by `serde_json` and consumed member by member
//! through a [`DeserializeSeed`]: each node object is visited in document
//! order and written through the store as it goes, without first building
//! the whole document in memory. A node that does not exist yet is created
//! as late as possible: attributes are held back until its
//! `jcr:primaryType` arrives, the first child needs a parent, or its object
//! closes. Errors confined to one attribute or one child subtree are
//! recorded in the [`ImportReport`] and reading continues.

use crate::error::{SyncError, SyncResult};
use crate::policy::{Seen, SyncPolicy};
use crate::report::ImportReport;
use crate::rules::MappingRules;
use crate::{CHILDREN_KEY, ORDER_KEY, PROPERTIES_KEY};
use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::Value;
use std::fmt;
use treesync_codec::{
    coerce, decode_scalar, parse_as, split_tag, Attribute, CodecResult, JsonScalar, Scalar,
    TypeTag,
};
use treesync_store::{NodeHandle, NodePath, NodeStore, MIXIN_TYPES, PRIMARY_TYPE};

/// The outcome of a successful import.
#[derive(Debug, Clone)]
pub struct Imported {
    /// The node at the target path.
    pub node: NodeHandle,
    /// What was written, kept, removed and skipped.
    pub report: ImportReport,
}

/// Imports a JSON document into the store at `target`.
///
/// If no node exists at `target` it is created; its parent must exist.
/// Attribute values that cannot be decoded or written, and child subtrees
/// that cannot be created, are skipped and listed in the report.
///
/// The store is the unit of work: the importer never commits or rolls back,
/// and a failed call may leave part of the document applied.
///
/// # Errors
///
/// Returns [`SyncError::Transport`] if the document is not well-formed JSON
/// or not an object, [`SyncError::Structural`] if the target node cannot be
/// resolved or created, and [`SyncError::Store`] if the store fails.
///
/// # Example
///
/// ```
/// use treesync_codec::Scalar;
/// use treesync_core::{import, MappingRules};
/// use treesync_store::{InMemoryStore, NodePath, NodeStore};
///
/// let mut store = InMemoryStore::new();
/// let target = NodePath::parse("/page").unwrap();
/// let imported = import(
///     r#"{"title": "Hello", "count": "{Long}3"}"#,
///     &mut store,
///     &target,
///     &MappingRules::new(),
/// )
/// .unwrap();
///
/// let count = store.attribute(&imported.node, "count").unwrap().unwrap();
/// assert_eq!(count.as_single(), Some(&Scalar::Long(3)));
/// assert_eq!(imported.report.written, 2);
/// ```
pub fn import<S: NodeStore + ?Sized>(
    text: &str,
    store: &mut S,
    target: &NodePath,
    rules: &MappingRules,
) -> SyncResult<Imported> {
    let mut importer = Importer {
        store,
        rules,
        policy: SyncPolicy::new(rules),
        report: ImportReport::default(),
        fatal: None,
    };
    let node = importer.run(text, target)?;
    tracing::debug!(path = %target, report = %importer.report, "import finished");
    Ok(Imported {
        node,
        report: importer.report,
    })
}

/// Attributes read before their node exists.
#[derive(Debug, Default)]
struct PendingSet {
    attributes: Vec<Attribute>,
}

impl PendingSet {
    fn insert(&mut self, attribute: Attribute) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name() == attribute.name())
        {
            Some(slot) => *slot = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Mixin types first, so that the attributes they permit can be written;
    /// then arrival order.
    fn into_ordered(mut self) -> Vec<Attribute> {
        if let Some(idx) = self.attributes.iter().position(|a| a.name() == MIXIN_TYPES) {
            let mixins = self.attributes.remove(idx);
            self.attributes.insert(0, mixins);
        }
        self.attributes
    }
}

enum NodeState {
    Unresolved { path: NodePath, pending: PendingSet },
    Resolved(NodeHandle),
}

impl NodeState {
    fn path(&self) -> &NodePath {
        match self {
            NodeState::Unresolved { path, .. } => path,
            NodeState::Resolved(handle) => handle.path(),
        }
    }
}

/// A member key of a node object.
enum Key {
    Properties,
    OrderHint,
    ReferenceView,
    Member(String),
}

impl Key {
    fn classify(name: String) -> Self {
        match name.as_str() {
            PROPERTIES_KEY => Key::Properties,
            ORDER_KEY => Key::OrderHint,
            CHILDREN_KEY => Key::ReferenceView,
            _ => Key::Member(name),
        }
    }
}

/// The `value` member of a descriptor.
enum RawValue {
    Missing,
    One(JsonScalar),
    Many(Vec<JsonScalar>),
    Nested,
}

struct Descriptor {
    name: Option<String>,
    tag: Option<JsonScalar>,
    multi: Option<JsonScalar>,
    value: RawValue,
}

impl Descriptor {
    fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Descriptor {
                name: None,
                tag: None,
                multi: None,
                value: RawValue::Missing,
            };
        };
        let name = match fields.remove("name") {
            Some(Value::String(name)) if !name.is_empty() => Some(name),
            _ => None,
        };
        let value = match fields.remove("value") {
            None => RawValue::Missing,
            Some(Value::Array(items)) => scalars(items).map_or(RawValue::Nested, RawValue::Many),
            Some(other) => scalar(other).map_or(RawValue::Nested, RawValue::One),
        };
        Descriptor {
            name,
            tag: fields.remove("type").and_then(scalar),
            multi: fields.remove("multi").and_then(scalar),
            value,
        }
    }
}

/// The scalar held by a JSON value, or `None` for an object or array.
fn scalar(value: Value) -> Option<JsonScalar> {
    match value {
        Value::Null => Some(JsonScalar::Null),
        Value::Bool(b) => Some(JsonScalar::Bool(b)),
        Value::Number(n) => Some(JsonScalar::Number(n.to_string())),
        Value::String(s) => Some(JsonScalar::String(s)),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// The elements of an array, or `None` if one of them is an object or array.
fn scalars(items: Vec<Value>) -> Option<Vec<JsonScalar>> {
    items.into_iter().map(scalar).collect()
}

/// Consumes the rest of an object.
fn drain<'de, A: MapAccess<'de>>(map: &mut A) -> Result<(), A::Error> {
    while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
    Ok(())
}

struct Importer<'a, S: ?Sized> {
    store: &'a mut S,
    rules: &'a MappingRules,
    policy: SyncPolicy<'a>,
    report: ImportReport,
    /// The error that stopped the parse; the parser itself only carries its
    /// message.
    fatal: Option<SyncError>,
}

/// Reads one node object, from its `{` to its `}`.
///
/// Yields `Ok(Err(_))` for a recoverable failure, after consuming the rest of
/// the object so that the caller can carry on with the next member. Any
/// other failure stops the parse.
struct NodeSeed<'i, 'a, S: ?Sized> {
    importer: &'i mut Importer<'a, S>,
    state: NodeState,
}

/// Reads the value of one member that is not a reserved key.
struct MemberSeed<'m, 'a, S: ?Sized> {
    importer: &'m mut Importer<'a, S>,
    state: &'m mut NodeState,
    seen: &'m mut Seen,
    name: &'m str,
}

impl<S: NodeStore + ?Sized> Importer<'_, S> {
    fn run(&mut self, text: &str, target: &NodePath) -> SyncResult<NodeHandle> {
        let state = match self.store.resolve(target)? {
            Some(handle) => NodeState::Resolved(handle),
            None => {
                let parent = target
                    .parent()
                    .ok_or_else(|| SyncError::structural(target, "root node is missing"))?;
                if self.store.resolve(&parent)?.is_none() {
                    return Err(SyncError::structural(target, "parent node does not exist"));
                }
                NodeState::Unresolved {
                    path: target.clone(),
                    pending: PendingSet::default(),
                }
            }
        };

        let mut de = serde_json::Deserializer::from_str(text);
        let parsed = NodeSeed {
            importer: &mut *self,
            state,
        }
        .deserialize(&mut de)
        .and_then(|outcome| de.end().map(|()| outcome));
        match parsed {
            Ok(outcome) => outcome,
            Err(err) => match self.fatal.take() {
                Some(fatal) => Err(fatal),
                None => Err(SyncError::Transport(err)),
            },
        }
    }

    /// Stops the parse with `err`, which [`Importer::run`] returns in place
    /// of the parser's error.
    fn abort<E: de::Error>(&mut self, err: SyncError) -> E {
        let error = E::custom(&err);
        self.fatal = Some(err);
        error
    }

    fn prune(&mut self, node: &NodeHandle, seen: &Seen) -> SyncResult<()> {
        self.policy
            .prune(&mut *self.store, node, seen, &mut self.report)
    }

    fn apply_properties(
        &mut self,
        state: &mut NodeState,
        seen: &mut Seen,
        value: Value,
    ) -> SyncResult<()> {
        let Value::Array(items) = value else {
            let err = SyncError::value_format(PROPERTIES_KEY, "expected an array");
            self.report
                .record_skip(state.path().as_str(), PROPERTIES_KEY, &err);
            return Ok(());
        };
        for descriptor in items.into_iter().map(Descriptor::from_value) {
            let Some(name) = descriptor.name.clone() else {
                let err = SyncError::value_format("", "descriptor without a name");
                self.report.record_skip(state.path().as_str(), "", &err);
                continue;
            };
            let decoded = self.decode_descriptor(&name, descriptor);
            self.accept(state, seen, &name, decoded)?;
        }
        Ok(())
    }

    /// Handles one decoded attribute.
    ///
    /// The name is recorded as seen even when the value could not be
    /// decoded, so a malformed value never causes an update to clear the
    /// stored one.
    fn accept(
        &mut self,
        state: &mut NodeState,
        seen: &mut Seen,
        name: &str,
        decoded: SyncResult<Option<Attribute>>,
    ) -> SyncResult<()> {
        seen.attribute(name);
        let attribute = match decoded {
            Ok(Some(attribute)) => attribute,
            Ok(None) => return Ok(()),
            Err(err) if err.is_recoverable() => {
                self.report.record_skip(state.path().as_str(), name, &err);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if name == PRIMARY_TYPE {
            return self.apply_primary_type(state, &attribute);
        }
        if !self.rules.import_attribute_filter.accept(name) {
            tracing::trace!(path = %state.path(), name, "attribute filtered out");
            return Ok(());
        }
        match state {
            NodeState::Unresolved { pending, .. } => {
                pending.insert(attribute);
                Ok(())
            }
            NodeState::Resolved(handle) => {
                let handle = handle.clone();
                self.write(&handle, attribute)
            }
        }
    }

    fn apply_primary_type(&mut self, state: &mut NodeState, attribute: &Attribute) -> SyncResult<()> {
        let Some(type_name) = attribute.as_single().and_then(Scalar::as_text) else {
            let err = SyncError::value_format(PRIMARY_TYPE, "expected a single name");
            self.report
                .record_skip(state.path().as_str(), PRIMARY_TYPE, &err);
            return Ok(());
        };
        match state {
            NodeState::Resolved(handle) => {
                if handle.primary_type() != type_name {
                    tracing::debug!(
                        path = %handle.path(),
                        existing = handle.primary_type(),
                        incoming = type_name,
                        "primary type differs, keeping existing"
                    );
                }
                Ok(())
            }
            NodeState::Unresolved { .. } => {
                let type_name = type_name.to_string();
                self.ensure_created(state, Some(&type_name)).map(|_| ())
            }
        }
    }

    /// Creates the node if it does not exist yet and writes its pending
    /// attributes.
    fn ensure_created(
        &mut self,
        state: &mut NodeState,
        type_hint: Option<&str>,
    ) -> SyncResult<NodeHandle> {
        let (path, pending) = match state {
            NodeState::Resolved(handle) => return Ok(handle.clone()),
            NodeState::Unresolved { path, pending } => (path.clone(), std::mem::take(pending)),
        };
        let parent_path = path
            .parent()
            .ok_or_else(|| SyncError::structural(&path, "root node is missing"))?;
        let parent = self
            .store
            .resolve(&parent_path)?
            .ok_or_else(|| SyncError::structural(&path, "parent node does not exist"))?;
        let handle = self
            .store
            .create_node(&parent, path.name(), type_hint)
            .map_err(|err| SyncError::from_node(&path, err))?;
        tracing::debug!(path = %path, node_type = handle.primary_type(), "node created");
        self.report.nodes_created += 1;
        *state = NodeState::Resolved(handle.clone());

        for attribute in pending.into_ordered() {
            self.write(&handle, attribute)?;
        }
        Ok(handle)
    }

    fn write(&mut self, node: &NodeHandle, attribute: Attribute) -> SyncResult<()> {
        let name = attribute.name().to_string();
        match self.policy.write(&mut *self.store, node, attribute) {
            Ok(outcome) => {
                self.report.record_write(outcome);
                Ok(())
            }
            Err(err) if err.is_recoverable() => {
                self.report.record_skip(node.path().as_str(), &name, &err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn ignores_binary(&self, name: &str) -> bool {
        let ignored = !self.rules.property_format.binary_mode.imports_values();
        if ignored {
            tracing::debug!(name, "binary value ignored");
        }
        ignored
    }

    fn decode_single(&self, name: &str, value: &JsonScalar) -> SyncResult<Option<Attribute>> {
        if let JsonScalar::String(text) = value {
            if matches!(split_tag(text), Some((TypeTag::Binary, _))) && self.ignores_binary(name) {
                return Ok(None);
            }
        }
        match decode_scalar(value) {
            Ok(Some(scalar)) => Ok(Some(Attribute::single(name, scalar))),
            Ok(None) => {
                tracing::debug!(name, "null value, attribute left alone");
                Ok(None)
            }
            Err(err) => Err(SyncError::value_format(name, err)),
        }
    }

    /// Builds a multi-valued attribute.
    ///
    /// With an explicit tag every element is read as exactly that type.
    /// Otherwise the first element decides the type and the rest are coerced
    /// to it, dropping any inline tag; an empty array is an empty String
    /// list.
    fn decode_multi(
        &self,
        name: &str,
        items: Option<Vec<JsonScalar>>,
        explicit: Option<TypeTag>,
    ) -> SyncResult<Option<Attribute>> {
        let Some(items) = items else {
            return Err(SyncError::value_format(name, "nested structure in a multi value"));
        };
        let tag = match (explicit, items.first()) {
            (Some(tag), _) => tag,
            (None, None) => TypeTag::String,
            (None, Some(first)) => infer_tag(first).ok_or_else(|| {
                SyncError::value_format(name, "null in a multi value")
            })?,
        };
        if tag == TypeTag::Binary && self.ignores_binary(name) {
            return Ok(None);
        }
        let values = items
            .iter()
            .map(|item| match explicit {
                Some(_) => read_exact(tag, item),
                None => coerce(tag, item),
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SyncError::value_format(name, err))?;
        Attribute::multi(name, tag, values)
            .map(Some)
            .map_err(|err| SyncError::value_format(name, err))
    }

    fn decode_descriptor(&self, name: &str, descriptor: Descriptor) -> SyncResult<Option<Attribute>> {
        let tag = match descriptor.tag {
            None => None,
            Some(JsonScalar::String(text)) => Some(
                TypeTag::from_name(&text)
                    .ok_or_else(|| SyncError::value_format(name, format!("unknown type {text:?}")))?,
            ),
            Some(_) => return Err(SyncError::value_format(name, "type must be a string")),
        };
        let multi = match descriptor.multi {
            None | Some(JsonScalar::Null) => None,
            Some(JsonScalar::Bool(multi)) => Some(multi),
            Some(_) => return Err(SyncError::value_format(name, "multi must be a boolean")),
        };

        match descriptor.value {
            RawValue::Missing | RawValue::One(JsonScalar::Null) => Ok(None),
            RawValue::Nested => Err(SyncError::value_format(name, "nested structure in a value")),
            RawValue::Many(_) if multi == Some(false) => Err(SyncError::value_format(
                name,
                "array given for a single-valued attribute",
            )),
            RawValue::Many(items) => self.decode_multi(name, Some(items), tag),
            RawValue::One(item) if multi == Some(true) => self.decode_multi(name, Some(vec![item]), tag),
            RawValue::One(item) => match tag {
                None => self.decode_single(name, &item),
                Some(TypeTag::Binary) if self.ignores_binary(name) => Ok(None),
                Some(tag) => read_exact(tag, &item)
                    .map(|scalar| Some(Attribute::single(name, scalar)))
                    .map_err(|err| SyncError::value_format(name, err)),
            },
        }
    }
}

impl<'de, S: NodeStore + ?Sized> DeserializeSeed<'de> for NodeSeed<'_, '_, S> {
    type Value = SyncResult<NodeHandle>;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, S: NodeStore + ?Sized> Visitor<'de> for NodeSeed<'_, '_, S> {
    type Value = SyncResult<NodeHandle>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a node object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let NodeSeed {
            importer,
            mut state,
        } = self;
        tracing::debug!(path = %state.path(), "importing node");
        let mut seen = Seen::default();

        while let Some(name) = map.next_key::<String>()? {
            let applied = match Key::classify(name) {
                Key::Properties => {
                    let value = map.next_value::<Value>()?;
                    importer.apply_properties(&mut state, &mut seen, value)
                }
                Key::OrderHint => {
                    tracing::debug!(path = %state.path(), "ignoring child order hint");
                    map.next_value::<IgnoredAny>()?;
                    Ok(())
                }
                Key::ReferenceView => {
                    tracing::debug!(path = %state.path(), "ignoring expanded reference");
                    map.next_value::<IgnoredAny>()?;
                    Ok(())
                }
                Key::Member(name) => map.next_value_seed(MemberSeed {
                    importer: &mut *importer,
                    state: &mut state,
                    seen: &mut seen,
                    name: &name,
                })?,
            };
            if let Err(err) = applied {
                if !err.is_recoverable() {
                    return Err(importer.abort(err));
                }
                drain(&mut map)?;
                return Ok(Err(err));
            }
        }

        let closed = match importer.ensure_created(&mut state, None) {
            Ok(node) => importer.prune(&node, &seen).map(|()| node),
            Err(err) => Err(err),
        };
        match closed {
            Err(err) if !err.is_recoverable() => Err(importer.abort(err)),
            outcome => Ok(outcome),
        }
    }
}

impl<S: NodeStore + ?Sized> MemberSeed<'_, '_, S> {
    fn scalar(self, value: JsonScalar) -> SyncResult<()> {
        let decoded = self.importer.decode_single(self.name, &value);
        self.importer.accept(self.state, self.seen, self.name, decoded)
    }
}

impl<'de, S: NodeStore + ?Sized> DeserializeSeed<'de> for MemberSeed<'_, '_, S> {
    type Value = SyncResult<()>;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, S: NodeStore + ?Sized> Visitor<'de> for MemberSeed<'_, '_, S> {
    type Value = SyncResult<()>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an attribute value or a child object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(self.scalar(JsonScalar::Null))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(self.scalar(JsonScalar::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(self.scalar(JsonScalar::Number(v.to_string())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(self.scalar(JsonScalar::Number(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(self.scalar(JsonScalar::Number(v.to_string())))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(self.scalar(JsonScalar::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(self.scalar(JsonScalar::String(v)))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        let decoded = self.importer.decode_multi(self.name, scalars(items), None);
        Ok(self.importer.accept(self.state, self.seen, self.name, decoded))
    }

    /// A nested object is a child node.
    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let MemberSeed {
            importer,
            state,
            seen,
            name,
        } = self;
        let parent = match importer.ensure_created(state, None) {
            Ok(parent) => parent,
            Err(err) => {
                drain(&mut map)?;
                return Ok(Err(err));
            }
        };
        seen.child(name);

        let path = match parent.path().child(name) {
            Ok(path) => path,
            Err(err) => {
                drain(&mut map)?;
                let err = SyncError::from_node(parent.path(), err);
                importer
                    .report
                    .record_child_failure(parent.path().as_str(), &err);
                return Ok(Ok(()));
            }
        };
        let child = match importer.store.resolve(&path) {
            Ok(Some(handle)) => NodeState::Resolved(handle),
            Ok(None) => NodeState::Unresolved {
                path: path.clone(),
                pending: PendingSet::default(),
            },
            Err(err) => return Err(importer.abort(err.into())),
        };
        let outcome = NodeSeed {
            importer: &mut *importer,
            state: child,
        }
        .visit_map(map)?;
        match outcome {
            Err(err) if err.is_recoverable() => {
                importer.report.record_child_failure(path.as_str(), &err);
                Ok(Ok(()))
            }
            other => Ok(other.map(|_| ())),
        }
    }
}

/// Reads a descriptor value as `tag`. Strings are taken literally, since a
/// descriptor's type is never carried inline.
fn read_exact(tag: TypeTag, value: &JsonScalar) -> CodecResult<Scalar> {
    match value {
        JsonScalar::String(text) => parse_as(tag, text),
        other => coerce(tag, other),
    }
}

/// The type a bare JSON scalar decodes to, or `None` for `null`.
fn infer_tag(value: &JsonScalar) -> Option<TypeTag> {
    match value {
        JsonScalar::Null => None,
        JsonScalar::Bool(_) => Some(TypeTag::Boolean),
        JsonScalar::Number(_) => Some(TypeTag::Long),
        JsonScalar::String(text) => Some(split_tag(text).map_or(TypeTag::String, |(tag, _)| tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ChangeRule, PropertyScope};
    use treesync_codec::BinaryMode;
    use treesync_store::{InMemoryStore, DEFAULT_NODE_TYPE};

    fn path(text: &str) -> NodePath {
        NodePath::parse(text).unwrap()
    }

    fn value(store: &InMemoryStore, at: &str, name: &str) -> Option<Attribute> {
        let node = store.resolve(&path(at)).unwrap().unwrap();
        store.attribute(&node, name).unwrap()
    }

    fn single(store: &InMemoryStore, at: &str, name: &str) -> Option<Scalar> {
        value(store, at, name).and_then(|a| a.as_single().cloned())
    }

    fn run(store: &mut InMemoryStore, at: &str, text: &str, rules: &MappingRules) -> Imported {
        import(text, store, &path(at), rules).unwrap()
    }

    #[test]
    fn bare_values_are_typed() {
        let mut store = InMemoryStore::new();
        run(
            &mut store,
            "/n",
            r#"{"s": "text", "b": true, "n": 42, "f": 2.0, "d": "{Date}2024-01-02T03:04:05.000+00:00"}"#,
            &MappingRules::new(),
        );
        assert_eq!(single(&store, "/n", "s"), Some(Scalar::from("text")));
        assert_eq!(single(&store, "/n", "b"), Some(Scalar::Boolean(true)));
        assert_eq!(single(&store, "/n", "n"), Some(Scalar::Long(42)));
        assert_eq!(single(&store, "/n", "f"), Some(Scalar::Long(2)));
        assert_eq!(value(&store, "/n", "d").unwrap().tag(), TypeTag::Date);
    }

    #[test]
    fn unknown_tags_fall_back_to_string() {
        let mut store = InMemoryStore::new();
        run(&mut store, "/n", r#"{"x": "{Wobble}42"}"#, &MappingRules::new());
        assert_eq!(single(&store, "/n", "x"), Some(Scalar::from("{Wobble}42")));
    }

    #[test]
    fn arrays_take_the_first_element_type() {
        let mut store = InMemoryStore::new();
        run(
            &mut store,
            "/n",
            r#"{"longs": ["{Long}1", "2", 3], "empty": [], "strings": ["a", "{String}{Long}9"]}"#,
            &MappingRules::new(),
        );
        let longs = value(&store, "/n", "longs").unwrap();
        assert_eq!(longs.tag(), TypeTag::Long);
        assert_eq!(
            longs.value().scalars(),
            &[Scalar::Long(1), Scalar::Long(2), Scalar::Long(3)]
        );
        let empty = value(&store, "/n", "empty").unwrap();
        assert_eq!(empty.tag(), TypeTag::String);
        assert!(empty.value().scalars().is_empty());
        let strings = value(&store, "/n", "strings").unwrap();
        assert_eq!(strings.value().scalars()[1], Scalar::from("{Long}9"));
    }

    #[test]
    fn existing_target_is_updated_in_place() {
        let mut store = InMemoryStore::new();
        let root = store.resolve(&NodePath::root()).unwrap().unwrap();
        let node = store.create_node(&root, "n", Some("nt:folder")).unwrap();
        let imported = run(
            &mut store,
            "/n",
            r#"{"jcr:primaryType": "{Name}nt:unstructured", "jcr:created": "{Date}2024-01-01"}"#,
            &MappingRules::new(),
        );
        assert_eq!(imported.node, node);
        assert_eq!(imported.node.primary_type(), "nt:folder");
        assert_eq!(imported.report.nodes_created, 0);
        assert!(imported.report.is_clean());
    }

    #[test]
    fn deferred_creation_uses_the_primary_type() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/folder",
            r#"{"jcr:created": "{Date}2024-01-01", "jcr:primaryType": "{Name}nt:folder"}"#,
            &MappingRules::new(),
        );
        assert_eq!(imported.node.primary_type(), "nt:folder");
        assert_eq!(imported.report.written, 1);
        assert!(value(&store, "/folder", "jcr:created").is_some());
    }

    #[test]
    fn pending_mixins_are_applied_first() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/folder",
            r#"{
                "jcr:title": "Docs",
                "jcr:mixinTypes": ["{Name}mix:title"],
                "jcr:primaryType": "{Name}nt:folder"
            }"#,
            &MappingRules::new(),
        );
        assert!(imported.report.is_clean(), "{:?}", imported.report.issues);
        assert_eq!(single(&store, "/folder", "jcr:title"), Some(Scalar::from("Docs")));
    }

    #[test]
    fn first_child_forces_creation_at_default_type() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/a",
            r#"{"child": {"x": 1}, "jcr:primaryType": "{Name}nt:folder"}"#,
            &MappingRules::new(),
        );
        assert_eq!(imported.node.primary_type(), DEFAULT_NODE_TYPE);
        assert_eq!(imported.report.nodes_created, 2);
        assert_eq!(single(&store, "/a/child", "x"), Some(Scalar::Long(1)));
    }

    #[test]
    fn missing_parent_is_structural() {
        let mut store = InMemoryStore::new();
        let err = import("{}", &mut store, &path("/no/such"), &MappingRules::new()).unwrap_err();
        assert!(matches!(err, SyncError::Structural { .. }));
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn bad_values_are_skipped() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/n",
            r#"{"when": "{Date}yesterday", "size": 1.5, "ok": "fine"}"#,
            &MappingRules::new(),
        );
        assert_eq!(imported.report.skipped, 2);
        assert_eq!(imported.report.written, 1);
        assert!(value(&store, "/n", "when").is_none());
        assert_eq!(single(&store, "/n", "ok"), Some(Scalar::from("fine")));
    }

    #[test]
    fn constraint_errors_do_not_abort() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/f",
            r#"{"jcr:primaryType": "{Name}nt:folder", "free": "x", "jcr:createdBy": "me"}"#,
            &MappingRules::new(),
        );
        assert_eq!(imported.report.skipped, 1);
        assert_eq!(imported.report.issues[0].name.as_deref(), Some("free"));
        assert_eq!(single(&store, "/f", "jcr:createdBy"), Some(Scalar::from("me")));
    }

    #[test]
    fn failed_child_is_isolated() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/p",
            r#"{
                "bad": {"jcr:primaryType": "{Name}x:unknown", "a": 1, "deep": {"b": 2}},
                "good": {"c": 3},
                "after": "still read"
            }"#,
            &MappingRules::new(),
        );
        assert_eq!(imported.report.failed_children, 1);
        assert!(store.resolve(&path("/p/bad")).unwrap().is_none());
        assert_eq!(single(&store, "/p/good", "c"), Some(Scalar::Long(3)));
        assert_eq!(single(&store, "/p", "after"), Some(Scalar::from("still read")));
    }

    #[test]
    fn leaf_type_children_fail_alone() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/r",
            r#"{"jcr:primaryType": "{Name}nt:resource", "kid": {}, "jcr:mimeType": "text/plain"}"#,
            &MappingRules::new(),
        );
        assert_eq!(imported.report.failed_children, 1);
        assert_eq!(single(&store, "/r", "jcr:mimeType"), Some(Scalar::from("text/plain")));
    }

    #[test]
    fn malformed_json_aborts() {
        let mut store = InMemoryStore::new();
        for text in [r#"{"a": 1"#, r#"{"a" 1}"#, "[1, 2]", r#"{"a": 1} trailing"#, ""] {
            let err = import(text, &mut store, &path("/n"), &MappingRules::new()).unwrap_err();
            assert!(matches!(err, SyncError::Transport(_)), "{text:?}: {err}");
        }
    }

    #[test]
    fn nested_arrays_are_skipped() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/n",
            r#"{"grid": [[1, 2], [3]], "tags": ["a", {"b": 1}], "after": true}"#,
            &MappingRules::new(),
        );
        assert_eq!(imported.report.skipped, 2);
        assert!(value(&store, "/n", "grid").is_none());
        assert!(value(&store, "/n", "tags").is_none());
        assert_eq!(single(&store, "/n", "after"), Some(Scalar::Boolean(true)));
    }

    #[test]
    fn non_object_descriptors_are_skipped() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/n",
            r#"{"__properties__": [7, {"name": "ok", "value": "yes"}], "more": {"__properties__": "x"}}"#,
            &MappingRules::new(),
        );
        assert_eq!(imported.report.skipped, 2);
        assert_eq!(single(&store, "/n", "ok"), Some(Scalar::from("yes")));
        assert!(store.resolve(&path("/n/more")).unwrap().is_some());
    }

    #[test]
    fn null_means_absent() {
        let mut store = InMemoryStore::new();
        let root = store.resolve(&NodePath::root()).unwrap().unwrap();
        let node = store.create_node(&root, "n", None).unwrap();
        store.set_attribute(&node, Attribute::single("keep", "x")).unwrap();
        let rules = MappingRules::new().with_change_rule(ChangeRule::Update);
        let imported = run(&mut store, "/n", r#"{"keep": null}"#, &rules);
        assert_eq!(imported.report.cleared, 0);
        assert_eq!(single(&store, "/n", "keep"), Some(Scalar::from("x")));
    }

    #[test]
    fn malformed_values_protect_existing_attributes() {
        let mut store = InMemoryStore::new();
        let root = store.resolve(&NodePath::root()).unwrap().unwrap();
        let node = store.create_node(&root, "n", None).unwrap();
        store.set_attribute(&node, Attribute::single("n", 5i64)).unwrap();
        let rules = MappingRules::new().with_change_rule(ChangeRule::Update);
        let imported = run(&mut store, "/n", r#"{"n": "{Long}five"}"#, &rules);
        assert_eq!(imported.report.skipped, 1);
        assert_eq!(single(&store, "/n", "n"), Some(Scalar::Long(5)));
    }

    #[test]
    fn reserved_members_are_not_written() {
        let mut store = InMemoryStore::new();
        let imported = run(
            &mut store,
            "/n",
            r#"{
                "__order__": ["b", "a"],
                "__children__": {"__reference__": "/x", "jcr:content": {"y": 1}},
                "a": {}
            }"#,
            &MappingRules::new(),
        );
        assert!(imported.report.is_clean());
        let node = store.resolve(&path("/n")).unwrap().unwrap();
        let children = store.children(&node).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(store.attributes(&node).unwrap().len(), 1);
    }

    #[test]
    fn descriptors_are_read() {
        let mut store = InMemoryStore::new();
        let rules = MappingRules::new().with_scope(PropertyScope::Definition);
        let imported = run(
            &mut store,
            "/n",
            r#"{"__properties__": [
                {"name": "count", "value": 3, "type": "Long", "multi": false},
                {"name": "ratio", "value": "0.5", "type": "Double"},
                {"name": "tags", "value": ["a"], "type": "String", "multi": true},
                {"name": "one", "value": "x", "type": "Name", "multi": true},
                {"name": "nums", "value": [], "type": "Long", "multi": true},
                {"name": "bad", "value": "x", "type": "Wobble"},
                {"value": "nameless"}
            ]}"#,
            &rules,
        );
        assert_eq!(single(&store, "/n", "count"), Some(Scalar::Long(3)));
        assert_eq!(single(&store, "/n", "ratio"), Some(Scalar::Double(0.5)));
        assert_eq!(value(&store, "/n", "tags").unwrap().value().scalars().len(), 1);
        let one = value(&store, "/n", "one").unwrap();
        assert!(one.arity().is_multi());
        assert_eq!(one.tag(), TypeTag::Name);
        let nums = value(&store, "/n", "nums").unwrap();
        assert_eq!(nums.tag(), TypeTag::Long);
        assert_eq!(imported.report.skipped, 2);
    }

    #[test]
    fn binaries_only_import_in_base64_mode() {
        let mut store = InMemoryStore::new();
        let text = r#"{"data": "{Binary}AQID", "link": "{Binary}/x/y"}"#;
        let imported = run(&mut store, "/n", text, &MappingRules::new());
        assert!(imported.report.is_clean());
        assert!(value(&store, "/n", "data").is_none());

        let rules = MappingRules::new().with_binary_mode(BinaryMode::Base64);
        let imported = run(&mut store, "/m", r#"{"data": "{Binary}AQID"}"#, &rules);
        assert!(imported.report.is_clean());
        assert_eq!(single(&store, "/m", "data"), Some(Scalar::Binary(vec![1, 2, 3])));
    }

    #[test]
    fn import_filter_blocks_writes() {
        let mut store = InMemoryStore::new();
        let rules = MappingRules::new().with_import_filter(|name: &str| name != "secret");
        run(&mut store, "/n", r#"{"secret": "s", "open": "o"}"#, &rules);
        assert!(value(&store, "/n", "secret").is_none());
        assert!(value(&store, "/n", "open").is_some());
    }

    #[test]
    fn pending_set_orders_mixins_first() {
        let mut pending = PendingSet::default();
        pending.insert(Attribute::single("a", "1"));
        pending.insert(Attribute::single(MIXIN_TYPES, "x"));
        pending.insert(Attribute::single("b", "2"));
        pending.insert(Attribute::single("a", "3"));
        let names: Vec<_> = pending
            .into_ordered()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, vec![MIXIN_TYPES, "a", "b"]);
    }
}
