//! Typed scalars and attributes.

use crate::date::truncate_date;
use crate::error::{CodecError, CodecResult};
use crate::types::{Arity, TypeTag};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decimal number kept in its literal form.
///
/// The literal is validated on construction (`[+-]?digits[.digits][e[+-]?digits]`)
/// but never rounded, so the text written out is exactly the text read in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Decimal(String);

impl Decimal {
    /// Parses a decimal literal.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ValueFormat`] if `text` is not a decimal literal.
    pub fn parse(text: &str) -> CodecResult<Self> {
        let trimmed = text.trim();
        if is_decimal_literal(trimmed) {
            Ok(Decimal(trimmed.to_string()))
        } else {
            Err(CodecError::value_format(
                TypeTag::Decimal,
                text,
                "not a decimal literal",
            ))
        }
    }

    /// The literal text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Decimal {
    type Error = CodecError;

    fn try_from(value: String) -> CodecResult<Self> {
        Decimal::parse(&value)
    }
}

impl From<Decimal> for String {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

fn is_decimal_literal(text: &str) -> bool {
    fn digits(bytes: &[u8], mut pos: usize) -> (usize, usize) {
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        (pos, pos - start)
    }

    let bytes = text.as_bytes();
    let mut pos = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        pos += 1;
    }
    let (next, int_digits) = digits(bytes, pos);
    pos = next;
    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        let (next, count) = digits(bytes, pos + 1);
        pos = next;
        frac_digits = count;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let (next, count) = digits(bytes, pos);
        if count == 0 {
            return false;
        }
        pos = next;
    }
    pos == bytes.len()
}

/// A single typed value.
///
/// Each variant corresponds to exactly one [`TypeTag`], so the tag of a
/// scalar is never ambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Scalar {
    /// UTF-8 text.
    String(String),
    /// Boolean.
    Boolean(bool),
    /// 64-bit signed integer.
    Long(i64),
    /// 64-bit float.
    Double(f64),
    /// Decimal literal.
    Decimal(Decimal),
    /// Timestamp with offset.
    ///
    /// Text forms carry milliseconds. Build dates through `From` or
    /// [`parse_date`](crate::parse_date), which truncate to that precision;
    /// a finer value set here directly does not survive export.
    Date(DateTime<FixedOffset>),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// Qualified name.
    Name(String),
    /// Repository path.
    Path(String),
    /// Hard reference (target path or identifier).
    Reference(String),
    /// Weak reference (target path or identifier).
    WeakReference(String),
    /// URI.
    #[serde(rename = "URI")]
    Uri(String),
    /// Untyped text.
    Undefined(String),
}

impl Scalar {
    /// Builds a scalar of a text-carrying tag.
    ///
    /// Returns `None` when `tag` does not carry its value as text.
    pub fn textual(tag: TypeTag, text: impl Into<String>) -> Option<Scalar> {
        let text = text.into();
        Some(match tag {
            TypeTag::String => Scalar::String(text),
            TypeTag::Name => Scalar::Name(text),
            TypeTag::Path => Scalar::Path(text),
            TypeTag::Reference => Scalar::Reference(text),
            TypeTag::WeakReference => Scalar::WeakReference(text),
            TypeTag::Uri => Scalar::Uri(text),
            TypeTag::Undefined => Scalar::Undefined(text),
            _ => return None,
        })
    }

    /// The type tag of this scalar.
    pub fn tag(&self) -> TypeTag {
        match self {
            Scalar::String(_) => TypeTag::String,
            Scalar::Boolean(_) => TypeTag::Boolean,
            Scalar::Long(_) => TypeTag::Long,
            Scalar::Double(_) => TypeTag::Double,
            Scalar::Decimal(_) => TypeTag::Decimal,
            Scalar::Date(_) => TypeTag::Date,
            Scalar::Binary(_) => TypeTag::Binary,
            Scalar::Name(_) => TypeTag::Name,
            Scalar::Path(_) => TypeTag::Path,
            Scalar::Reference(_) => TypeTag::Reference,
            Scalar::WeakReference(_) => TypeTag::WeakReference,
            Scalar::Uri(_) => TypeTag::Uri,
            Scalar::Undefined(_) => TypeTag::Undefined,
        }
    }

    /// The text of a text-carrying scalar.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::String(s)
            | Scalar::Name(s)
            | Scalar::Path(s)
            | Scalar::Reference(s)
            | Scalar::WeakReference(s)
            | Scalar::Uri(s)
            | Scalar::Undefined(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is a Boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is a Long.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Scalar::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// The bytes, if this is a Binary.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Scalar::Binary(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Boolean(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Long(n)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Double(n)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(b: Vec<u8>) -> Self {
        Scalar::Binary(b)
    }
}

impl From<DateTime<FixedOffset>> for Scalar {
    fn from(d: DateTime<FixedOffset>) -> Self {
        Scalar::Date(truncate_date(d))
    }
}

/// The value of an attribute: one scalar or a homogeneous sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Single-valued.
    Single(Scalar),
    /// Multi-valued. The tag is kept so that an empty sequence stays typed.
    Multi {
        /// Element type.
        tag: TypeTag,
        /// Elements, all of type `tag`.
        values: Vec<Scalar>,
    },
}

impl AttributeValue {
    /// The type tag of the value.
    pub fn tag(&self) -> TypeTag {
        match self {
            AttributeValue::Single(scalar) => scalar.tag(),
            AttributeValue::Multi { tag, .. } => *tag,
        }
    }

    /// The arity of the value.
    pub fn arity(&self) -> Arity {
        match self {
            AttributeValue::Single(_) => Arity::Single,
            AttributeValue::Multi { .. } => Arity::Multi,
        }
    }

    /// All scalars, in order. A single value yields one element.
    pub fn scalars(&self) -> &[Scalar] {
        match self {
            AttributeValue::Single(scalar) => std::slice::from_ref(scalar),
            AttributeValue::Multi { values, .. } => values,
        }
    }
}

/// A named, typed, single- or multi-valued property of a tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    value: AttributeValue,
}

impl Attribute {
    /// Creates a single-valued attribute.
    pub fn single(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Single(value.into()),
        }
    }

    /// Creates a multi-valued attribute.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ValueFormat`] if any element is not of type `tag`.
    pub fn multi(name: impl Into<String>, tag: TypeTag, values: Vec<Scalar>) -> CodecResult<Self> {
        if let Some(stray) = values.iter().find(|v| v.tag() != tag) {
            return Err(CodecError::value_format(
                tag,
                stray.tag().as_str(),
                "element of a different type in a multi value",
            ));
        }
        Ok(Self {
            name: name.into(),
            value: AttributeValue::Multi { tag, values },
        })
    }

    /// Creates an attribute from an already assembled value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ValueFormat`] if a multi value is not homogeneous.
    pub fn new(name: impl Into<String>, value: AttributeValue) -> CodecResult<Self> {
        match value {
            AttributeValue::Single(scalar) => Ok(Self::single(name, scalar)),
            AttributeValue::Multi { tag, values } => Self::multi(name, tag, values),
        }
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attribute value.
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Consumes the attribute and returns its value.
    pub fn into_value(self) -> AttributeValue {
        self.value
    }

    /// The type tag.
    pub fn tag(&self) -> TypeTag {
        self.value.tag()
    }

    /// The arity.
    pub fn arity(&self) -> Arity {
        self.value.arity()
    }

    /// Returns the single scalar, or `None` for multi values.
    pub fn as_single(&self) -> Option<&Scalar> {
        match &self.value {
            AttributeValue::Single(scalar) => Some(scalar),
            AttributeValue::Multi { .. } => None,
        }
    }
}
