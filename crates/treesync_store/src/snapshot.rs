//! Serializable store contents and file persistence.

use crate::backend::DEFAULT_NODE_TYPE;
use crate::error::{StoreError, StoreResult};
use crate::node_type::NodeTypeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use treesync_codec::Attribute;

/// One node as held by the in-memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct NodeRecord {
    pub(crate) primary_type: String,
    #[serde(default)]
    pub(crate) attributes: Vec<Attribute>,
    #[serde(default)]
    pub(crate) children: Vec<String>,
}

impl NodeRecord {
    pub(crate) fn new(primary_type: impl Into<String>) -> Self {
        Self {
            primary_type: primary_type.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// A point-in-time copy of an [`InMemoryStore`](crate::InMemoryStore).
///
/// Snapshots let a caller emulate commit and rollback around an import, and
/// are the on-disk format used by the command-line tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub(crate) nodes: BTreeMap<String, NodeRecord>,
    #[serde(default)]
    pub(crate) types: NodeTypeRegistry,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), NodeRecord::new(DEFAULT_NODE_TYPE));
        Self {
            nodes,
            types: NodeTypeRegistry::default(),
        }
    }
}

impl StoreSnapshot {
    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Reads a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a snapshot, or
    /// describes an inconsistent tree.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&text)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Writes the snapshot to a JSON file.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so a failed write leaves the previous file intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), nodes = self.nodes.len(), "snapshot saved");
        Ok(())
    }

    /// Checks that the root exists and that parent and child links agree.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Snapshot`] describing the first inconsistency.
    pub fn validate(&self) -> StoreResult<()> {
        if !self.nodes.contains_key("/") {
            return Err(StoreError::Snapshot("snapshot has no root node".into()));
        }
        for (path, record) in &self.nodes {
            for child in &record.children {
                let child_path = if path == "/" {
                    format!("/{child}")
                } else {
                    format!("{path}/{child}")
                };
                if !self.nodes.contains_key(&child_path) {
                    return Err(StoreError::Snapshot(format!(
                        "{path} lists missing child {child}"
                    )));
                }
            }
            if path != "/" {
                let (parent, name) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
                let parent = if parent.is_empty() { "/" } else { parent };
                let listed = self
                    .nodes
                    .get(parent)
                    .is_some_and(|p| p.children.iter().any(|c| c == name));
                if !listed {
                    return Err(StoreError::Snapshot(format!(
                        "{path} is not listed by its parent"
                    )));
                }
            }
        }
        Ok(())
    }
}
