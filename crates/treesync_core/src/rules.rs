//! Mapping rules.

use crate::filter::{AcceptAll, AttributeFilter, NodeFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use treesync_codec::BinaryMode;

/// Name of the child followed by reference expansion.
pub const DEFAULT_CONTENT_NODE: &str = "jcr:content";

/// How attributes are written into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PropertyScope {
    /// One plain JSON member per attribute, with inline `{Type}` tags.
    #[default]
    Value,
    /// A `__properties__` array of explicit descriptors.
    Definition,
}

/// Attribute encoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyFormat {
    /// Document shape.
    pub scope: PropertyScope,
    /// Binary handling.
    pub binary_mode: BinaryMode,
}

impl PropertyFormat {
    /// Creates a format.
    pub const fn new(scope: PropertyScope, binary_mode: BinaryMode) -> Self {
        Self { scope, binary_mode }
    }
}

/// How imported attributes are merged with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChangeRule {
    /// Write every imported attribute.
    #[default]
    Replace,
    /// Write only attributes the node does not have yet.
    Extend,
    /// Replace, then remove attributes and children the document omits.
    Update,
}

impl fmt::Display for ChangeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeRule::Replace => "replace",
            ChangeRule::Extend => "extend",
            ChangeRule::Update => "update",
        })
    }
}

impl FromStr for ChangeRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(ChangeRule::Replace),
            "extend" => Ok(ChangeRule::Extend),
            "update" => Ok(ChangeRule::Update),
            other => Err(format!("unknown change rule: {other}")),
        }
    }
}

/// Options for one export or import call.
///
/// Rules are cheap to clone; filters are shared.
///
/// # Example
///
/// ```
/// use treesync_core::{ChangeRule, MappingRules, PropertyScope};
///
/// let rules = MappingRules::new()
///     .with_max_depth(2)
///     .with_scope(PropertyScope::Definition)
///     .with_change_rule(ChangeRule::Update)
///     .with_import_filter(|name: &str| name != "jcr:uuid");
/// assert_eq!(rules.max_depth, 2);
/// ```
#[derive(Clone)]
pub struct MappingRules {
    /// Which children are exported, and which may be deleted by an update.
    pub child_filter: Arc<dyn NodeFilter>,
    /// Which attributes are exported.
    pub export_attribute_filter: Arc<dyn AttributeFilter>,
    /// Which attributes are imported, and which may be cleared by an update.
    pub import_attribute_filter: Arc<dyn AttributeFilter>,
    /// Attribute encoding.
    pub property_format: PropertyFormat,
    /// Deepest level exported; 0 is unlimited.
    pub max_depth: usize,
    /// Merge semantics on import.
    pub change_rule: ChangeRule,
    /// Prefix for binary links.
    pub link_prefix: String,
    /// Whether reference-only nodes show their target's content.
    pub expand_references: bool,
    /// Child followed by reference expansion.
    pub content_node_name: String,
    /// Whether exported text is indented.
    pub pretty: bool,
}

impl Default for MappingRules {
    fn default() -> Self {
        Self {
            child_filter: Arc::new(AcceptAll),
            export_attribute_filter: Arc::new(AcceptAll),
            import_attribute_filter: Arc::new(AcceptAll),
            property_format: PropertyFormat::default(),
            max_depth: 0,
            change_rule: ChangeRule::default(),
            link_prefix: String::new(),
            expand_references: true,
            content_node_name: DEFAULT_CONTENT_NODE.to_string(),
            pretty: true,
        }
    }
}

impl fmt::Debug for MappingRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRules")
            .field("property_format", &self.property_format)
            .field("max_depth", &self.max_depth)
            .field("change_rule", &self.change_rule)
            .field("link_prefix", &self.link_prefix)
            .field("expand_references", &self.expand_references)
            .field("content_node_name", &self.content_node_name)
            .field("pretty", &self.pretty)
            .finish_non_exhaustive()
    }
}

impl MappingRules {
    /// Creates rules with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the child filter.
    #[must_use]
    pub fn with_child_filter(mut self, filter: impl NodeFilter + 'static) -> Self {
        self.child_filter = Arc::new(filter);
        self
    }

    /// Sets the export attribute filter.
    #[must_use]
    pub fn with_export_filter(mut self, filter: impl AttributeFilter + 'static) -> Self {
        self.export_attribute_filter = Arc::new(filter);
        self
    }

    /// Sets the import attribute filter.
    #[must_use]
    pub fn with_import_filter(mut self, filter: impl AttributeFilter + 'static) -> Self {
        self.import_attribute_filter = Arc::new(filter);
        self
    }

    /// Sets the property format.
    #[must_use]
    pub fn with_property_format(mut self, format: PropertyFormat) -> Self {
        self.property_format = format;
        self
    }

    /// Sets the property scope.
    #[must_use]
    pub fn with_scope(mut self, scope: PropertyScope) -> Self {
        self.property_format.scope = scope;
        self
    }

    /// Sets the binary mode.
    #[must_use]
    pub fn with_binary_mode(mut self, mode: BinaryMode) -> Self {
        self.property_format.binary_mode = mode;
        self
    }

    /// Sets the maximum depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the change rule.
    #[must_use]
    pub fn with_change_rule(mut self, rule: ChangeRule) -> Self {
        self.change_rule = rule;
        self
    }

    /// Sets the binary link prefix.
    #[must_use]
    pub fn with_link_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.link_prefix = prefix.into();
        self
    }

    /// Enables or disables reference expansion.
    #[must_use]
    pub fn with_reference_expansion(mut self, value: bool) -> Self {
        self.expand_references = value;
        self
    }

    /// Sets the child followed by reference expansion.
    #[must_use]
    pub fn with_content_node_name(mut self, name: impl Into<String>) -> Self {
        self.content_node_name = name.into();
        self
    }

    /// Sets whether exported text is indented.
    #[must_use]
    pub fn with_pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }

    /// Returns true if children at `depth` may be descended into.
    pub(crate) const fn descends(&self, depth: usize) -> bool {
        self.max_depth == 0 || depth < self.max_depth
    }
}
