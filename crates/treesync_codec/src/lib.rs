//! # treesync codec
//!
//! Typed attribute values and their JSON text forms.
//!
//! This crate provides:
//! - The closed set of attribute types ([`TypeTag`]) and their arity
//! - Typed scalars and attributes ([`Scalar`], [`Attribute`])
//! - Canonical text forms, including the compact `{Tag}value` encoding
//! - Date and base64 handling
//! - [`JsonScalar`], the scalar shapes a JSON document can hold
//!
//! ## Compact encoding
//!
//! ```
//! use treesync_codec::{decode_tagged, encode_tagged, Scalar};
//!
//! let encoded = encode_tagged(&Scalar::Long(42));
//! assert_eq!(encoded, "{Long}42");
//! assert_eq!(decode_tagged(&encoded).unwrap(), Scalar::Long(42));
//!
//! // Unknown tags are not stripped.
//! assert_eq!(
//!     decode_tagged("{Wobble}42").unwrap(),
//!     Scalar::String("{Wobble}42".to_string())
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod binary;
mod date;
mod error;
mod text;
mod types;
mod value;

pub use binary::{binary_link, decode_base64, encode_base64, BinaryMode};
pub use date::{format_date, parse_date, truncate_date, CANONICAL_DATE_FORMAT};
pub use error::{CodecError, CodecResult};
pub use text::{
    coerce, decode_scalar, decode_tagged, encode_tagged, parse_as, split_tag, to_text, JsonScalar,
};
pub use types::{Arity, TypeTag};
pub use value::{Attribute, AttributeValue, Decimal, Scalar};
