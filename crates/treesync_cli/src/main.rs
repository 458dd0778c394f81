//! treesync command-line tool.
//!
//! Exports and imports JSON documents against a store kept in a snapshot
//! file.
//!
//! Usage:
//!   treesync --store site.json init
//!   treesync --store site.json export /content --depth 2
//!   treesync --store site.json import /content --input doc.json --rule update
//!   treesync --store site.json inspect

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::RuleArgs;

/// treesync command-line tool
#[derive(Parser)]
#[command(name = "treesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Snapshot file holding the store
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty store holding only the root node
    Init {
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },

    /// Print the JSON document for a subtree
    Export {
        /// Path of the subtree root
        path: String,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Apply a JSON document to a subtree
    Import {
        /// Path of the target node
        path: String,

        /// Document to read (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Merge rule (replace, extend, update)
        #[arg(short, long, default_value = "replace")]
        rule: String,

        /// Report format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Show node and attribute counts and the tree outline
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { force } => {
            let store = cli.store.ok_or("--store is required for init")?;
            commands::init::run(&store, force)?;
        }
        Commands::Export { path, rules } => {
            let store = cli.store.ok_or("--store is required for export")?;
            commands::export::run(&store, &path, &rules)?;
        }
        Commands::Import {
            path,
            input,
            rule,
            format,
            rules,
        } => {
            let store = cli.store.ok_or("--store is required for import")?;
            commands::import::run(&store, &path, input.as_deref(), &rule, &rules, &format)?;
        }
        Commands::Inspect { format } => {
            let store = cli.store.ok_or("--store is required for inspect")?;
            commands::inspect::run(&store, &format)?;
        }
        Commands::Version => {
            println!("treesync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("treesync_core v{}", treesync_core::VERSION);
        }
    }

    Ok(())
}
