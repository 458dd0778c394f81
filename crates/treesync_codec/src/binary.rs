//! Binary value handling.

use crate::error::{CodecError, CodecResult};
use crate::types::TypeTag;
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};

/// How binary attributes are represented in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BinaryMode {
    /// Emit an opaque fetch reference. Export only: link values are ignored
    /// on import.
    Link,
    /// Emit the bytes as standard padded base64. Round-trips.
    Base64,
    /// Leave binary attributes out entirely.
    #[default]
    Skip,
}

impl BinaryMode {
    /// Returns true if binary values read in this mode should be written to
    /// the store.
    pub const fn imports_values(self) -> bool {
        matches!(self, BinaryMode::Base64)
    }
}

/// Encodes bytes as padded base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    Base64::encode_string(bytes)
}

/// Decodes padded base64 text.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`CodecError::ValueFormat`] if the text is not valid base64.
pub fn decode_base64(text: &str) -> CodecResult<Vec<u8>> {
    Base64::decode_vec(text.trim())
        .map_err(|e| CodecError::value_format(TypeTag::Binary, text, e.to_string()))
}

/// Builds the fetch reference written for a binary attribute in
/// [`BinaryMode::Link`].
pub fn binary_link(prefix: &str, node_path: &str, name: &str) -> String {
    if node_path.ends_with('/') {
        format!("{prefix}{node_path}{name}")
    } else {
        format!("{prefix}{node_path}/{name}")
    }
}
