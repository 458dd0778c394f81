//! Node and attribute predicates.
//!
//! The engine treats filters as opaque: it asks them yes-or-no questions and
//! never combines them. Closures work directly:
//!
//! ```
//! use treesync_core::{AttributeFilter, NodeFilter};
//! use treesync_store::NodeHandle;
//!
//! let no_secrets = |name: &str| !name.starts_with("secret");
//! assert!(no_secrets.accept("title"));
//! assert!(!no_secrets.accept("secretKey"));
//!
//! let shallow = |node: &NodeHandle| node.path().depth() < 3;
//! # let _ = shallow;
//! ```

use std::collections::BTreeSet;
use treesync_store::NodeHandle;

/// Decides which child nodes are visited.
pub trait NodeFilter: Send + Sync {
    /// Returns true if the node is included.
    fn accept(&self, node: &NodeHandle) -> bool;
}

/// Decides which attributes are exported or imported.
pub trait AttributeFilter: Send + Sync {
    /// Returns true if the attribute named `name` is included.
    fn accept(&self, name: &str) -> bool;
}

impl<F> NodeFilter for F
where
    F: Fn(&NodeHandle) -> bool + Send + Sync,
{
    fn accept(&self, node: &NodeHandle) -> bool {
        self(node)
    }
}

impl<F> AttributeFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accept(&self, name: &str) -> bool {
        self(name)
    }
}

/// Accepts every node and every attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl NodeFilter for AcceptAll {
    fn accept(&self, _node: &NodeHandle) -> bool {
        true
    }
}

impl AttributeFilter for AcceptAll {
    fn accept(&self, _name: &str) -> bool {
        true
    }
}

/// Rejects a fixed set of attribute names.
#[derive(Debug, Clone, Default)]
pub struct ExcludeNames {
    names: BTreeSet<String>,
}

impl ExcludeNames {
    /// Creates a filter rejecting the given names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if no name is excluded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl AttributeFilter for ExcludeNames {
    fn accept(&self, name: &str) -> bool {
        !self.names.contains(name)
    }
}
