//! Text forms of typed scalars.
//!
//! Every scalar has one canonical text form ([`to_text`]) and can be read back
//! from it for a known tag ([`parse_as`]). The compact document encoding adds
//! an inline `{Tag}` prefix ([`encode_tagged`]) so that the tag survives a
//! trip through a plain JSON string.

use crate::binary::{decode_base64, encode_base64};
use crate::date::{format_date, parse_date};
use crate::error::{CodecError, CodecResult};
use crate::types::TypeTag;
use crate::value::{Decimal, Scalar};

/// A JSON scalar as handed over by the document parser.
///
/// Numbers are kept as text so that the caller decides how to interpret
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonScalar {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// A number, e.g. `-12.5`.
    Number(String),
    /// A string.
    String(String),
}

/// Returns the canonical text form of a scalar.
///
/// Binary values are rendered as base64.
pub fn to_text(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Boolean(b) => b.to_string(),
        Scalar::Long(n) => n.to_string(),
        Scalar::Double(n) => n.to_string(),
        Scalar::Decimal(d) => d.to_string(),
        Scalar::Date(d) => format_date(d),
        Scalar::Binary(bytes) => encode_base64(bytes),
        Scalar::String(s)
        | Scalar::Name(s)
        | Scalar::Path(s)
        | Scalar::Reference(s)
        | Scalar::WeakReference(s)
        | Scalar::Uri(s)
        | Scalar::Undefined(s) => s.clone(),
    }
}

/// Parses text as a scalar of the given tag.
///
/// # Errors
///
/// Returns [`CodecError::ValueFormat`] if the text is not a valid value of
/// that type.
pub fn parse_as(tag: TypeTag, text: &str) -> CodecResult<Scalar> {
    match tag {
        TypeTag::Boolean => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(Scalar::Boolean(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(Scalar::Boolean(false))
            } else {
                Err(CodecError::value_format(tag, text, "expected true or false"))
            }
        }
        TypeTag::Long => parse_long(text).map(Scalar::Long),
        TypeTag::Double => text
            .trim()
            .parse::<f64>()
            .map(Scalar::Double)
            .map_err(|e| CodecError::value_format(tag, text, e.to_string())),
        TypeTag::Decimal => Decimal::parse(text).map(Scalar::Decimal),
        TypeTag::Date => parse_date(text).map(Scalar::Date),
        TypeTag::Binary => decode_base64(text).map(Scalar::Binary),
        textual => Scalar::textual(textual, text)
            .ok_or_else(|| CodecError::value_format(textual, text, "not a text type")),
    }
}

/// Parses an integer, accepting integral numbers written with a fraction or
/// exponent (`2.0`, `1e3`).
fn parse_long(text: &str) -> CodecResult<i64> {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    // i64::MIN..=i64::MAX as f64 bounds
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    match trimmed.parse::<f64>() {
        Ok(n) if n.fract() == 0.0 && n >= LOWER && n < UPPER => Ok(n as i64),
        Ok(_) => Err(CodecError::value_format(
            TypeTag::Long,
            text,
            "not an integer in range",
        )),
        Err(e) => Err(CodecError::value_format(TypeTag::Long, text, e.to_string())),
    }
}

/// Splits a `{Tag}rest` prefix off `text` when `Tag` is a known type name.
///
/// Unknown tags are not split: `{Wobble}42` yields `None`.
pub fn split_tag(text: &str) -> Option<(TypeTag, &str)> {
    let rest = text.strip_prefix('{')?;
    let close = rest.find('}')?;
    let tag = TypeTag::from_name(&rest[..close])?;
    Some((tag, &rest[close + 1..]))
}

/// Encodes a scalar in the compact tagged form.
///
/// Strings are written bare unless their text would itself be read as a
/// tagged value, in which case they get an explicit `{String}` prefix.
pub fn encode_tagged(scalar: &Scalar) -> String {
    match scalar {
        Scalar::String(s) if split_tag(s).is_none() => s.clone(),
        other => format!("{{{}}}{}", other.tag(), to_text(other)),
    }
}

/// Decodes the compact tagged form of a JSON string.
///
/// Text with a recognized `{Tag}` prefix is parsed as that type; anything
/// else is a String, prefix included.
///
/// # Errors
///
/// Returns [`CodecError::ValueFormat`] if the tagged text does not parse.
pub fn decode_tagged(text: &str) -> CodecResult<Scalar> {
    match split_tag(text) {
        Some((tag, rest)) => parse_as(tag, rest),
        None => Ok(Scalar::String(text.to_string())),
    }
}

/// Decodes a bare JSON scalar, inferring its type.
///
/// Booleans become Boolean, numbers become Long, strings go through
/// [`decode_tagged`]. `null` carries no value and yields `None`.
///
/// # Errors
///
/// Returns [`CodecError::ValueFormat`] for non-integral numbers and for
/// tagged strings that do not parse.
pub fn decode_scalar(value: &JsonScalar) -> CodecResult<Option<Scalar>> {
    match value {
        JsonScalar::Null => Ok(None),
        JsonScalar::Bool(b) => Ok(Some(Scalar::Boolean(*b))),
        JsonScalar::Number(raw) => parse_long(raw).map(|n| Some(Scalar::Long(n))),
        JsonScalar::String(text) => decode_tagged(text).map(Some),
    }
}

/// Reads a JSON scalar as a value of a known type.
///
/// A recognized `{Tag}` prefix on a string is dropped before parsing, so
/// tagged array elements and descriptor values are accepted as well as bare
/// ones.
///
/// # Errors
///
/// Returns [`CodecError::ValueFormat`] if the value cannot be read as `tag`,
/// including `null`.
pub fn coerce(tag: TypeTag, value: &JsonScalar) -> CodecResult<Scalar> {
    match value {
        JsonScalar::Null => Err(CodecError::value_format(tag, "null", "null value")),
        JsonScalar::Bool(b) => parse_as(tag, if *b { "true" } else { "false" }),
        JsonScalar::Number(raw) => parse_as(tag, raw),
        JsonScalar::String(text) => match split_tag(text) {
            Some((_, rest)) => parse_as(tag, rest),
            None => parse_as(tag, text),
        },
    }
}
