//! Inspect command implementation.

use super::{open_store, CommandResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use treesync_store::{InMemoryStore, NodeHandle, NodePath, NodeStore};

/// Summary of a store.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Snapshot file.
    pub path: String,
    /// Number of nodes, root included.
    pub node_count: usize,
    /// Number of attributes over all nodes.
    pub attribute_count: usize,
    /// Deepest node level.
    pub max_depth: usize,
    /// Node count per primary type.
    pub node_types: BTreeMap<String, usize>,
    /// Every node, depth first.
    pub nodes: Vec<NodeSummary>,
}

/// One line of the outline.
#[derive(Debug, Serialize)]
pub struct NodeSummary {
    /// Node path.
    pub path: String,
    /// Number of segments; 0 for the root.
    pub depth: usize,
    /// Primary type.
    pub primary_type: String,
    /// Attribute count.
    pub attributes: usize,
}

/// Collects the summary of the store at `store_path`.
pub fn inspect(store_path: &Path) -> CommandResult<InspectResult> {
    let store = open_store(store_path)?;
    let root = store
        .resolve(&NodePath::root())?
        .ok_or("store has no root node")?;

    let mut result = InspectResult {
        path: store_path.display().to_string(),
        node_count: 0,
        attribute_count: 0,
        max_depth: 0,
        node_types: BTreeMap::new(),
        nodes: Vec::new(),
    };
    visit(&store, &root, &mut result)?;
    Ok(result)
}

fn visit(store: &InMemoryStore, node: &NodeHandle, result: &mut InspectResult) -> CommandResult<()> {
    let attributes = store.attributes(node)?.len();
    result.node_count += 1;
    result.attribute_count += attributes;
    result.max_depth = result.max_depth.max(node.path().depth());
    *result
        .node_types
        .entry(node.primary_type().to_string())
        .or_default() += 1;
    result.nodes.push(NodeSummary {
        path: node.path().to_string(),
        depth: node.path().depth(),
        primary_type: node.primary_type().to_string(),
        attributes,
    });
    for child in store.children(node)? {
        visit(store, &child, result)?;
    }
    Ok(())
}

/// Prints the summary.
pub fn run(store_path: &Path, format: &str) -> CommandResult<()> {
    let result = inspect(store_path)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            println!("Store Inspection: {}", result.path);
            println!("================{}", "=".repeat(result.path.len() + 2));
            println!();
            println!("Nodes:      {}", result.node_count);
            println!("Attributes: {}", result.attribute_count);
            println!("Max depth:  {}", result.max_depth);
            println!();
            println!("Node Types");
            println!("----------");
            for (name, count) in &result.node_types {
                println!("  {name}: {count}");
            }
            println!();
            println!("Outline");
            println!("-------");
            for node in &result.nodes {
                let label = node.path.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or("/");
                println!(
                    "  {}{} [{}] ({} attributes)",
                    "  ".repeat(node.depth),
                    label,
                    node.primary_type,
                    node.attributes
                );
            }
        }
    }
    Ok(())
}
