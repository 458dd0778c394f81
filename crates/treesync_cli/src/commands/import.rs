//! Import command implementation.

use super::{open_store, CommandResult, RuleArgs};
use std::io::Read;
use std::path::Path;
use treesync_core::{ChangeRule, ImportReport};
use treesync_store::NodePath;

/// Applies `text` at `node` and saves the store if the import completes.
///
/// Nothing is written back when the document cannot be read.
pub fn apply(
    store_path: &Path,
    node: &str,
    text: &str,
    rule: &str,
    args: &RuleArgs,
) -> CommandResult<ImportReport> {
    let rule: ChangeRule = rule.parse()?;
    let rules = args.to_rules()?.with_change_rule(rule);
    let target = NodePath::parse(node)?;

    let mut store = open_store(store_path)?;
    let imported = treesync_core::import(text, &mut store, &target, &rules)?;
    store.snapshot().save(store_path)?;
    tracing::info!(
        path = %imported.node.path(),
        rule = %rule,
        issues = imported.report.issues.len(),
        "import applied"
    );
    Ok(imported.report)
}

/// Reads the document, applies it and prints the report.
pub fn run(
    store_path: &Path,
    node: &str,
    input: Option<&Path>,
    rule: &str,
    args: &RuleArgs,
    format: &str,
) -> CommandResult<()> {
    let text = match input {
        Some(file) => std::fs::read_to_string(file)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let report = apply(store_path, node, &text, rule, args)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &ImportReport) {
    println!("Import Report");
    println!("=============");
    println!("{report}");

    if !report.issues.is_empty() {
        println!();
        println!("Issues");
        println!("------");
        for issue in &report.issues {
            match &issue.name {
                Some(name) => println!("  {} @{}: {}", issue.path, name, issue.message),
                None => println!("  {}: {}", issue.path, issue.message),
            }
        }
    }
}
