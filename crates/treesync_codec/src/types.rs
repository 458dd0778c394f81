//! Attribute type tags and arity.

use crate::error::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of semantic value types an attribute can carry.
///
/// The names returned by [`TypeTag::as_str`] are the spellings used on the
/// wire, both in `{Tag}` prefixes and in the `type` field of property
/// descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeTag {
    /// UTF-8 text.
    String,
    /// `true` or `false`.
    Boolean,
    /// 64-bit signed integer.
    Long,
    /// 64-bit float.
    Double,
    /// Arbitrary precision decimal.
    Decimal,
    /// Point in time with a UTC offset.
    Date,
    /// Raw bytes.
    Binary,
    /// A qualified name such as `nt:unstructured`.
    Name,
    /// A repository path.
    Path,
    /// Hard reference to another node.
    Reference,
    /// Reference that does not keep its target alive.
    WeakReference,
    /// A URI.
    #[serde(rename = "URI")]
    Uri,
    /// Type not known.
    Undefined,
}

impl TypeTag {
    /// Every tag, in declaration order.
    pub const ALL: [TypeTag; 13] = [
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
        TypeTag::Undefined,
    ];

    /// Wire spelling of the tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            TypeTag::String => "String",
            TypeTag::Boolean => "Boolean",
            TypeTag::Long => "Long",
            TypeTag::Double => "Double",
            TypeTag::Decimal => "Decimal",
            TypeTag::Date => "Date",
            TypeTag::Binary => "Binary",
            TypeTag::Name => "Name",
            TypeTag::Path => "Path",
            TypeTag::Reference => "Reference",
            TypeTag::WeakReference => "WeakReference",
            TypeTag::Uri => "URI",
            TypeTag::Undefined => "Undefined",
        }
    }

    /// Looks up a tag by its exact wire spelling.
    pub fn from_name(name: &str) -> Option<TypeTag> {
        Self::ALL.iter().copied().find(|tag| tag.as_str() == name)
    }

    /// Returns true for tags whose scalar is carried as plain text.
    pub const fn is_textual(self) -> bool {
        matches!(
            self,
            TypeTag::String
                | TypeTag::Name
                | TypeTag::Path
                | TypeTag::Reference
                | TypeTag::WeakReference
                | TypeTag::Uri
                | TypeTag::Undefined
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        Self::from_name(s).ok_or_else(|| CodecError::unknown_type(s))
    }
}

/// Cardinality of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    /// Exactly one scalar.
    Single,
    /// An ordered, possibly empty, sequence of scalars.
    Multi,
}

impl Arity {
    /// Returns true for [`Arity::Multi`].
    pub const fn is_multi(self) -> bool {
        matches!(self, Arity::Multi)
    }
}
