//! Absolute node paths.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Member names the document format uses for itself.
///
/// Neither nodes nor attributes may carry them, so a document member with
/// one of these keys is never mistaken for stored content.
pub const RESERVED_NAMES: [&str; 4] = ["__properties__", "__order__", "__children__", "__reference__"];

/// Returns true for a name in [`RESERVED_NAMES`].
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// A validated, absolute, slash-delimited node path.
///
/// The root is `/`. Every other path is `/` followed by one or more
/// non-empty segments separated by `/`; `.` and `..` are not allowed as
/// segments. A single trailing slash is accepted on input and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    /// The root path `/`.
    pub fn root() -> Self {
        NodePath("/".to_string())
    }

    /// Parses and validates a path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if the text is not an absolute
    /// path made of valid segments.
    pub fn parse(text: &str) -> StoreResult<Self> {
        if !text.starts_with('/') {
            return Err(invalid(text, "path must start with '/'"));
        }
        if text == "/" {
            return Ok(Self::root());
        }
        let body = text.strip_suffix('/').unwrap_or(text);
        for segment in body[1..].split('/') {
            validate_name(segment).map_err(|reason| invalid(text, reason))?;
        }
        Ok(NodePath(body.to_string()))
    }

    /// Returns the path of the child `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if `name` is not a valid segment.
    pub fn child(&self, name: &str) -> StoreResult<Self> {
        validate_name(name).map_err(|reason| invalid(name, reason))?;
        if self.is_root() {
            Ok(NodePath(format!("/{name}")))
        } else {
            Ok(NodePath(format!("{}/{name}", self.0)))
        }
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(NodePath(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// The last segment; empty for the root.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Number of segments; 0 for the root.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Returns true for `/`.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Iterates over the segments from the root down.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Returns true if `other` lies strictly below this path.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'/'
    }

    /// The path as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Checks that `name` can be used as a single path segment.
///
/// # Errors
///
/// Returns a short reason when the name is empty, contains `/`, is `.` or
/// `..`, or is one of the [`RESERVED_NAMES`].
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        Err("empty segment")
    } else if name.contains('/') {
        Err("segment contains '/'")
    } else if name == "." || name == ".." {
        Err("relative segment")
    } else if is_reserved(name) {
        Err("reserved name")
    } else {
        Ok(())
    }
}

fn invalid(text: &str, reason: &'static str) -> StoreError {
    StoreError::InvalidPath {
        path: text.to_string(),
        reason,
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodePath {
    type Error = StoreError;

    fn try_from(value: String) -> StoreResult<Self> {
        NodePath::parse(&value)
    }
}

impl From<NodePath> for String {
    fn from(value: NodePath) -> Self {
        value.0
    }
}

impl std::str::FromStr for NodePath {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        NodePath::parse(s)
    }
}
