//! Export command implementation.

use super::{open_store, require_node, CommandResult, RuleArgs};
use std::path::Path;

/// Renders the document for the subtree at `node`.
pub fn document(store_path: &Path, node: &str, args: &RuleArgs) -> CommandResult<String> {
    let rules = args.to_rules()?;
    let store = open_store(store_path)?;
    let handle = require_node(&store, node)?;
    Ok(treesync_core::export(&store, &handle, &rules)?)
}

/// Prints the document for the subtree at `node`.
pub fn run(store_path: &Path, node: &str, args: &RuleArgs) -> CommandResult<()> {
    println!("{}", document(store_path, node, args)?);
    Ok(())
}
