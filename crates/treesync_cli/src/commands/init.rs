//! Init command implementation.

use super::CommandResult;
use std::path::Path;
use treesync_store::StoreSnapshot;

/// Writes a snapshot holding only the root node.
pub fn run(path: &Path, force: bool) -> CommandResult<()> {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    StoreSnapshot::default().save(path)?;
    tracing::info!(path = %path.display(), "store initialized");
    println!("Initialized empty store at {}", path.display());
    Ok(())
}
