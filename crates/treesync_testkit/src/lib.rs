//! # treesync testkit
//!
//! Test utilities for treesync.
//!
//! This crate provides:
//! - Store fixtures and snapshot file helpers
//! - Property-based generators for typed values and small trees
//! - A round-trip harness tying export and import together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use treesync_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_sample_store(|store| {
//!         let site = node(store, "/site");
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
