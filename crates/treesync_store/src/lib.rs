//! # treesync store
//!
//! The node store abstraction the synchronization engine reads and writes.
//!
//! A store holds a tree of nodes addressed by absolute [`NodePath`]s. Each
//! node has a primary type, optional mixin types and a set of typed
//! [`Attribute`](treesync_codec::Attribute)s. The store enforces its own
//! type rules; the engine only reacts to the errors it reports.
//!
//! ## Design Principles
//!
//! - The engine never commits or rolls back: the caller owns the unit of work
//! - Handles are plain values, not live references
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - Reference store, persisted via [`StoreSnapshot`]
//!
//! ## Example
//!
//! ```rust
//! use treesync_codec::{Attribute, Scalar};
//! use treesync_store::{InMemoryStore, NodePath, NodeStore};
//!
//! let mut store = InMemoryStore::new();
//! let root = store.resolve(&NodePath::root()).unwrap().unwrap();
//! let node = store.create_node(&root, "page", None).unwrap();
//! store.set_attribute(&node, Attribute::single("count", 3i64)).unwrap();
//! let count = store.attribute(&node, "count").unwrap().unwrap();
//! assert_eq!(count.as_single(), Some(&Scalar::Long(3)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod node_type;
mod path;
mod snapshot;

pub use backend::{NodeHandle, NodeStore, DEFAULT_NODE_TYPE, MIXIN_TYPES, PRIMARY_TYPE};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use node_type::{NodeType, NodeTypeRegistry};
pub use path::{is_reserved, validate_name, NodePath, RESERVED_NAMES};
pub use snapshot::StoreSnapshot;
