use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Natural-language content editing for remote WordPress-style sites
#[derive(Parser)]
#[command(name = "copydesk")]
#[command(about = "Propose, review, apply, and roll back content edits", long_about = None)]
pub struct Cli {
    /// Select a saved site by URL fragment (defaults to the first saved site)
    #[arg(short, long, global = true)]
    pub site: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List saved sites
    Sites {
        /// Probe each site's API root
        #[arg(long)]
        probe: bool,
    },
    /// List items in a collection endpoint
    Items {
        /// Collection name, e.g. posts or pages
        endpoint: String,
    },
    /// Generate an action plan from a natural-language command
    Propose {
        /// The command, e.g. "Delete post 42"
        command: String,
        /// Target endpoint; inferred from the command when omitted
        #[arg(short, long)]
        endpoint: Option<String>,
        /// Write the plan JSON here for a later apply
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Execute a reviewed plan file
    Apply {
        /// Plan JSON produced by propose
        plan: PathBuf,
        /// Target endpoint
        #[arg(short, long, default_value = "posts")]
        endpoint: String,
    },
    /// Restore the most recently backed-up item
    Rollback,
    /// Show recent entries from the error log
    Errors {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}
