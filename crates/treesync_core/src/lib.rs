//! # treesync core
//!
//! Export, import and synchronization of typed attribute trees.
//!
//! This crate provides:
//! - [`export`] - render a subtree as a JSON document
//! - [`import`] - apply a JSON document to a store, best-effort
//! - [`MappingRules`] - depth, filters, encoding and merge options
//! - [`SyncPolicy`] - the replace, extend and update semantics
//!
//! ## Round trip
//!
//! ```
//! use treesync_codec::{Attribute, TypeTag};
//! use treesync_core::{export, import, MappingRules};
//! use treesync_store::{InMemoryStore, NodePath, NodeStore};
//!
//! let mut source = InMemoryStore::new();
//! let root = source.resolve(&NodePath::root()).unwrap().unwrap();
//! let page = source.create_node(&root, "page", None).unwrap();
//! let tags = Attribute::multi("tags", TypeTag::String, vec!["a".into(), "b".into()]).unwrap();
//! source.set_attribute(&page, tags).unwrap();
//!
//! let rules = MappingRules::new();
//! let text = export(&source, &page, &rules).unwrap();
//!
//! let mut target = InMemoryStore::new();
//! let imported = import(&text, &mut target, &NodePath::parse("/copy").unwrap(), &rules).unwrap();
//! assert_eq!(export(&target, &imported.node, &rules).unwrap(), text);
//! ```
//!
//! ## Reserved members
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `__properties__` | Descriptor array in definition scope |
//! | `__order__` | Child order hint; read and ignored |
//! | `__children__` | Expanded reference view; never imported |
//! | `__reference__` | First member of `__children__`: the followed reference |

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod export;
mod filter;
mod import;
mod policy;
mod report;
mod rules;

pub use error::{SyncError, SyncResult};
pub use export::{export, export_value};
pub use filter::{AcceptAll, AttributeFilter, ExcludeNames, NodeFilter};
pub use import::{import, Imported};
pub use policy::{Seen, SyncPolicy, WriteOutcome};
pub use report::{ImportIssue, ImportReport, IssueKind};
pub use rules::{ChangeRule, MappingRules, PropertyFormat, PropertyScope, DEFAULT_CONTENT_NODE};

/// Member holding the attribute descriptors in definition scope.
pub const PROPERTIES_KEY: &str = "__properties__";

/// Member holding a child order hint.
pub const ORDER_KEY: &str = "__order__";

/// Member holding the expanded view of a referenced node.
pub const CHILDREN_KEY: &str = "__children__";

/// First member of the expanded view: the reference that was followed.
pub const REFERENCE_KEY: &str = "__reference__";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
