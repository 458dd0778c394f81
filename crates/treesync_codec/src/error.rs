//! Error types for the codec crate.

use crate::types::TypeTag;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while reading attribute values from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A text value could not be coerced to its declared type.
    #[error("cannot read {text:?} as {tag}: {reason}")]
    ValueFormat {
        /// The type the text was coerced to.
        tag: TypeTag,
        /// The offending text (truncated for very long inputs).
        text: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// A type name did not match any known type tag.
    #[error("unknown type name: {name}")]
    UnknownType {
        /// The unrecognized name.
        name: String,
    },
}

const MAX_REPORTED_TEXT: usize = 64;

impl CodecError {
    /// Create a value format error.
    pub fn value_format(tag: TypeTag, text: &str, reason: impl Into<String>) -> Self {
        let text = if text.len() > MAX_REPORTED_TEXT {
            let mut end = MAX_REPORTED_TEXT;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &text[..end])
        } else {
            text.to_string()
        };
        Self::ValueFormat {
            tag,
            text,
            reason: reason.into(),
        }
    }

    /// Create an unknown type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }
}
