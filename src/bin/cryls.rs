//! The `cryls` command-line entry point.
//!
//! The JSON-RPC transport lives elsewhere; this binary exposes the parts of
//! the core that are useful standalone: printing the configured search
//! roots and scanning a workspace for sources.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cryls_lsp::WorkspaceConfig;

#[derive(Parser)]
#[command(name = "cryls", about = "Semantic analysis core for a Crystal language server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the ordered index search roots for a workspace
    Roots {
        /// Workspace root directory
        path: PathBuf,
    },
    /// Enumerate the `.cr` sources the indexer would visit
    Scan {
        /// Workspace root directory
        path: PathBuf,
        /// Emit a JSON array instead of one path per line
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Roots { path } => {
            let config = WorkspaceConfig::new(&path.display().to_string());
            for root in config.search_roots() {
                println!("{}", root.display());
            }
        }
        Command::Scan { path, json } => {
            let config = WorkspaceConfig::new(&path.display().to_string());
            let files = config.scan_files();
            if json {
                let paths: Vec<String> =
                    files.iter().map(|file| file.display().to_string()).collect();
                println!("{}", serde_json::to_string_pretty(&paths)?);
            } else {
                for file in &files {
                    println!("{}", file.display());
                }
                tracing::info!(count = files.len(), "workspace sources");
            }
        }
    }
    Ok(())
}
