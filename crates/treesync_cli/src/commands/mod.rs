//! CLI command implementations.

pub mod export;
pub mod import;
pub mod init;
pub mod inspect;

use clap::Args;
use std::path::Path;
use treesync_codec::BinaryMode;
use treesync_core::{ExcludeNames, MappingRules, PropertyScope};
use treesync_store::{InMemoryStore, NodeHandle, NodePath, NodeStore, StoreSnapshot};

/// Result type shared by the commands.
pub type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Mapping options shared by `export` and `import`.
#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    /// Attribute encoding (value, definition)
    #[arg(long, default_value = "value")]
    pub scope: String,

    /// Binary handling (skip, base64, link)
    #[arg(long, default_value = "skip")]
    pub binary: String,

    /// Prefix for binary links
    #[arg(long)]
    pub link_prefix: Option<String>,

    /// Deepest level to export, 0 for unlimited
    #[arg(short, long, default_value_t = 0)]
    pub depth: usize,

    /// Attribute to leave out (repeatable)
    #[arg(long = "exclude-attr")]
    pub exclude_attr: Vec<String>,

    /// Write compact JSON
    #[arg(long)]
    pub compact: bool,

    /// Do not expand referenced content
    #[arg(long)]
    pub no_references: bool,
}

impl RuleArgs {
    /// Builds the mapping rules described by the flags.
    pub fn to_rules(&self) -> CommandResult<MappingRules> {
        let scope = match self.scope.to_ascii_lowercase().as_str() {
            "value" => PropertyScope::Value,
            "definition" => PropertyScope::Definition,
            other => return Err(format!("unknown scope: {other}").into()),
        };
        let binary = match self.binary.to_ascii_lowercase().as_str() {
            "skip" => BinaryMode::Skip,
            "base64" => BinaryMode::Base64,
            "link" => BinaryMode::Link,
            other => return Err(format!("unknown binary mode: {other}").into()),
        };

        let mut rules = MappingRules::new()
            .with_scope(scope)
            .with_binary_mode(binary)
            .with_max_depth(self.depth)
            .with_pretty(!self.compact)
            .with_reference_expansion(!self.no_references);
        if let Some(prefix) = &self.link_prefix {
            rules = rules.with_link_prefix(prefix.clone());
        }
        if !self.exclude_attr.is_empty() {
            let excluded = ExcludeNames::new(self.exclude_attr.iter().cloned());
            rules = rules
                .with_export_filter(excluded.clone())
                .with_import_filter(excluded);
        }
        Ok(rules)
    }
}

/// Opens the store held in a snapshot file.
pub fn open_store(path: &Path) -> CommandResult<InMemoryStore> {
    if !path.exists() {
        return Err(format!("store not found: {} (run init first)", path.display()).into());
    }
    let snapshot = StoreSnapshot::load(path)?;
    tracing::debug!(path = %path.display(), nodes = snapshot.node_count(), "store loaded");
    Ok(InMemoryStore::from_snapshot(snapshot))
}

/// Resolves a node that must exist.
pub fn require_node(store: &InMemoryStore, path: &str) -> CommandResult<NodeHandle> {
    let node_path = NodePath::parse(path)?;
    store
        .resolve(&node_path)?
        .ok_or_else(|| format!("node not found: {node_path}").into())
}
