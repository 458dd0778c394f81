//! Property-based test generators using proptest.
//!
//! Every value produced here survives an export/import round trip with
//! base64 binaries: doubles are finite, dates carry millisecond precision
//! and whole-minute offsets, multi-valued attributes are never empty.

use chrono::{DateTime, FixedOffset, TimeZone};
use proptest::prelude::*;
use std::collections::BTreeMap;
use treesync_codec::{Attribute, AttributeValue, Decimal, Scalar, TypeTag};

/// Type tags whose values round-trip.
pub const ROUND_TRIP_TAGS: &[TypeTag] = &[
    TypeTag::String,
    TypeTag::Boolean,
    TypeTag::Long,
    TypeTag::Double,
    TypeTag::Decimal,
    TypeTag::Date,
    TypeTag::Binary,
    TypeTag::Name,
    TypeTag::Path,
    TypeTag::Reference,
    TypeTag::WeakReference,
    TypeTag::Uri,
];

/// Strategy for generating a round-trippable type tag.
pub fn tag_strategy() -> impl Strategy<Value = TypeTag> {
    prop::sample::select(ROUND_TRIP_TAGS)
}

/// Names drawn by both [`attribute_name_strategy`] and
/// [`child_name_strategy`], so that generated nodes often hold an attribute
/// and a child of the same name.
pub const SHARED_NAMES: &[&str] = &["a", "body", "item", "x"];

/// Strategy for generating attribute names.
pub fn attribute_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => prop::sample::select(SHARED_NAMES).prop_map(String::from),
        2 => prop::string::string_regex("[a-z][a-z0-9_]{0,9}").expect("Invalid regex"),
    ]
}

/// Strategy for generating child node names.
pub fn child_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => prop::sample::select(SHARED_NAMES).prop_map(String::from),
        2 => prop::string::string_regex("[a-z][a-z0-9]{0,7}").expect("Invalid regex"),
    ]
}

/// Strategy for generating dates with millisecond precision.
pub fn date_strategy() -> impl Strategy<Value = DateTime<FixedOffset>> {
    (
        -2_000_000_000_000i64..4_000_000_000_000i64,
        -(12 * 60)..=(14 * 60),
    )
        .prop_filter_map("date out of range", |(millis, offset_minutes)| {
            FixedOffset::east_opt(offset_minutes * 60)?
                .timestamp_millis_opt(millis)
                .single()
        })
}

/// Strategy for generating decimal literals.
pub fn decimal_strategy() -> impl Strategy<Value = Decimal> {
    prop::string::string_regex("-?[0-9]{1,12}(\\.[0-9]{1,6})?")
        .expect("Invalid regex")
        .prop_map(|text| Decimal::parse(&text).expect("Generated literal is valid"))
}

fn text(pattern: &str) -> impl Strategy<Value = String> {
    prop::string::string_regex(pattern).expect("Invalid regex")
}

/// Strategy for generating a scalar of the given type.
pub fn scalar_strategy(tag: TypeTag) -> BoxedStrategy<Scalar> {
    match tag {
        TypeTag::String => any::<String>().prop_map(Scalar::String).boxed(),
        TypeTag::Boolean => any::<bool>().prop_map(Scalar::Boolean).boxed(),
        TypeTag::Long => any::<i64>().prop_map(Scalar::Long).boxed(),
        TypeTag::Double => any::<f64>()
            .prop_filter("finite", |n| n.is_finite())
            .prop_map(Scalar::Double)
            .boxed(),
        TypeTag::Decimal => decimal_strategy().prop_map(Scalar::Decimal).boxed(),
        TypeTag::Date => date_strategy().prop_map(Scalar::Date).boxed(),
        TypeTag::Binary => prop::collection::vec(any::<u8>(), 0..48)
            .prop_map(Scalar::Binary)
            .boxed(),
        TypeTag::Name => text("[a-z]{1,4}:[a-zA-Z]{1,12}").prop_map(Scalar::Name).boxed(),
        TypeTag::Path => text("(/[a-z0-9]{1,8}){1,4}").prop_map(Scalar::Path).boxed(),
        TypeTag::Reference => text("[0-9a-f]{8}-[0-9a-f]{4}")
            .prop_map(Scalar::Reference)
            .boxed(),
        TypeTag::WeakReference => text("[0-9a-f]{8}-[0-9a-f]{4}")
            .prop_map(Scalar::WeakReference)
            .boxed(),
        TypeTag::Uri => text("https://[a-z]{1,10}\\.example/[a-z0-9]{0,10}")
            .prop_map(Scalar::Uri)
            .boxed(),
        TypeTag::Undefined => text("[a-z ]{0,12}").prop_map(Scalar::Undefined).boxed(),
    }
}

/// Strategy for generating a single or non-empty multi value.
pub fn attribute_value_strategy() -> impl Strategy<Value = AttributeValue> {
    tag_strategy().prop_flat_map(|tag| {
        prop_oneof![
            2 => scalar_strategy(tag).prop_map(AttributeValue::Single),
            1 => prop::collection::vec(scalar_strategy(tag), 1..4)
                .prop_map(move |values| AttributeValue::Multi { tag, values }),
        ]
    })
}

/// Strategy for generating a named attribute.
pub fn attribute_strategy() -> impl Strategy<Value = Attribute> {
    (attribute_name_strategy(), attribute_value_strategy()).prop_map(|(name, value)| {
        Attribute::new(name, value).expect("Generated values are homogeneous")
    })
}

/// Strategy for generating a set of attributes with distinct names.
pub fn attributes_strategy(max: usize) -> impl Strategy<Value = Vec<Attribute>> {
    prop::collection::btree_map(attribute_name_strategy(), attribute_value_strategy(), 0..=max)
        .prop_map(|members| {
            members
                .into_iter()
                .map(|(name, value)| {
                    Attribute::new(name, value).expect("Generated values are homogeneous")
                })
                .collect()
        })
}

/// A generated subtree: attributes plus named children.
#[derive(Debug, Clone, Default)]
pub struct TreeSpec {
    /// Attributes of this node.
    pub attributes: Vec<Attribute>,
    /// Children by name.
    pub children: BTreeMap<String, TreeSpec>,
}

impl TreeSpec {
    /// Number of nodes, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(TreeSpec::node_count).sum::<usize>()
    }

    /// Deepest level below this node; 0 for a leaf.
    pub fn depth(&self) -> usize {
        self.children
            .values()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Strategy for generating small trees.
pub fn tree_strategy() -> impl Strategy<Value = TreeSpec> {
    let leaf = attributes_strategy(4).prop_map(|attributes| TreeSpec {
        attributes,
        children: BTreeMap::new(),
    });
    leaf.prop_recursive(3, 16, 3, |inner| {
        (
            attributes_strategy(4),
            prop::collection::btree_map(child_name_strategy(), inner, 0..3),
        )
            .prop_map(|(attributes, children)| TreeSpec {
                attributes,
                children,
            })
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
