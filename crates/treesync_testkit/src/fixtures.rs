//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common tree shapes.

use chrono::{FixedOffset, TimeZone};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use treesync_codec::{Attribute, Scalar, TypeTag};
use treesync_store::{InMemoryStore, NodeHandle, NodePath, NodeStore, StoreSnapshot};

/// A test store with an optional snapshot file and automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: InMemoryStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates an empty store holding only the root.
    pub fn memory() -> Self {
        Self {
            store: InMemoryStore::new(),
            temp_dir: None,
        }
    }

    /// Creates an empty store backed by a snapshot file in a temp directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = InMemoryStore::new();
        store
            .snapshot()
            .save(&temp_dir.path().join("store.json"))
            .expect("Failed to write snapshot");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the snapshot path if file-backed, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("store.json"))
    }

    /// Writes the current contents to the snapshot file.
    pub fn persist(&self) {
        let path = self.path().expect("In-memory store has no snapshot file");
        self.store
            .snapshot()
            .save(&path)
            .expect("Failed to write snapshot");
    }

    /// Reloads the store from the snapshot file.
    pub fn reload(&mut self) {
        let path = self.path().expect("In-memory store has no snapshot file");
        self.store = load_store(&path);
    }
}

impl std::ops::Deref for TestStore {
    type Target = InMemoryStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl std::ops::DerefMut for TestStore {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.store
    }
}

/// Loads a store from a snapshot file.
pub fn load_store(path: &Path) -> InMemoryStore {
    InMemoryStore::from_snapshot(StoreSnapshot::load(path).expect("Failed to load snapshot"))
}

/// Parses a path, panicking on malformed input.
pub fn path(text: &str) -> NodePath {
    NodePath::parse(text).expect("Invalid node path")
}

/// Resolves a node that must exist.
pub fn node(store: &InMemoryStore, text: &str) -> NodeHandle {
    store
        .resolve(&path(text))
        .expect("Failed to resolve node")
        .unwrap_or_else(|| panic!("Node not found: {text}"))
}

/// Reads one attribute of a node that must exist.
pub fn attribute(store: &InMemoryStore, node_path: &str, name: &str) -> Option<Attribute> {
    store
        .attribute(&node(store, node_path), name)
        .expect("Failed to read attribute")
}

/// Creates every missing node along `text` with the default type.
pub fn ensure_path(store: &mut InMemoryStore, text: &str) -> NodeHandle {
    let mut current = node(store, "/");
    for segment in path(text).segments() {
        let next = current.path().child(segment).expect("Invalid segment");
        current = match store.resolve(&next).expect("Failed to resolve node") {
            Some(existing) => existing,
            None => store
                .create_node(&current, segment, None)
                .expect("Failed to create node"),
        };
    }
    current
}

/// Sets several attributes on one node.
pub fn set_all(store: &mut InMemoryStore, node: &NodeHandle, attributes: Vec<Attribute>) {
    for attribute in attributes {
        store
            .set_attribute(node, attribute)
            .expect("Failed to set attribute");
    }
}

/// Runs a test with a fresh empty store.
pub fn with_store<F, R>(f: F) -> R
where
    F: FnOnce(&mut InMemoryStore) -> R,
{
    let mut test_store = TestStore::memory();
    f(&mut test_store.store)
}

/// Runs a test with [`scenarios::site`] loaded.
pub fn with_sample_store<F, R>(f: F) -> R
where
    F: FnOnce(&mut InMemoryStore) -> R,
{
    let mut store = scenarios::site();
    f(&mut store)
}

/// Runs a test with a snapshot file holding an empty store.
pub fn with_snapshot_file<F, R>(f: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store.path().expect("File store should have a path");
    f(&path)
}

/// Common tree shapes.
pub mod scenarios {
    use super::*;

    /// `/site` with one attribute of most types, `/site/about` and
    /// `/site/about/team`.
    pub fn site() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        let site = ensure_path(&mut store, "/site");
        let published = FixedOffset::east_opt(2 * 3600)
            .and_then(|offset| offset.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).single())
            .expect("Valid date");
        set_all(
            &mut store,
            &site,
            vec![
                Attribute::single("title", "Welcome"),
                Attribute::single("count", 12i64),
                Attribute::single("ratio", 0.25f64),
                Attribute::single("flag", false),
                Attribute::single("published", published),
                Attribute::single("home", Scalar::Path("/site/about".into())),
                Attribute::multi("tags", TypeTag::String, vec!["news".into(), "{Long}1".into()])
                    .expect("Homogeneous values"),
                Attribute::single("data", vec![0u8, 159, 146, 150]),
            ],
        );
        let about = ensure_path(&mut store, "/site/about");
        set_all(&mut store, &about, vec![Attribute::single("body", "Hello there")]);
        let team = ensure_path(&mut store, "/site/about/team");
        set_all(&mut store, &team, vec![Attribute::single("size", 4i64)]);
        store
    }

    /// A page whose only attribute references a shared node with content.
    ///
    /// `/page` references `/shared`, which holds `jcr:content` with a title.
    pub fn referencing_page() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        let content = ensure_path(&mut store, "/shared/jcr:content");
        set_all(&mut store, &content, vec![Attribute::single("title", "Shared")]);
        let page = ensure_path(&mut store, "/page");
        set_all(
            &mut store,
            &page,
            vec![Attribute::single("target", Scalar::Reference("/shared".into()))],
        );
        store
    }

    /// A flat node with `count` children named `child0`, `child1`, ...
    pub fn wide(count: usize) -> InMemoryStore {
        let mut store = InMemoryStore::new();
        let parent = ensure_path(&mut store, "/wide");
        for i in 0..count {
            let child = store
                .create_node(&parent, &format!("child{i}"), None)
                .expect("Failed to create child");
            set_all(&mut store, &child, vec![Attribute::single("index", i as i64)]);
        }
        store
    }

    /// A chain `/deep/l1/l2/...` of the given depth below `/deep`.
    pub fn deep(depth: usize) -> InMemoryStore {
        let mut store = InMemoryStore::new();
        let mut text = String::from("/deep");
        ensure_path(&mut store, &text);
        for level in 1..=depth {
            text.push_str(&format!("/l{level}"));
            let node = ensure_path(&mut store, &text);
            set_all(&mut store, &node, vec![Attribute::single("level", level as i64)]);
        }
        store
    }
}
