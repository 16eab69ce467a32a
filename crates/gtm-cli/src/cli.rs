//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Git time metric.
///
/// Passively records which files you touch while working and attaches the
/// time spent on each file to your commits as git notes.
#[derive(Debug, Parser)]
#[command(name = "gtm", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize time tracking for the current git repository.
    Init,

    /// Record a file or terminal event.
    Record {
        /// Record terminal activity for the project in the current directory.
        #[arg(long, conflicts_with = "file")]
        terminal: bool,

        /// After recording, print the pending total.
        #[arg(long)]
        status: bool,

        /// The file that was saved.
        file: Option<PathBuf>,
    },

    /// Attribute pending time to a commit (run by the post-commit hook).
    Commit {
        /// Commit to attribute time to.
        #[arg(default_value = "HEAD")]
        rev: String,
    },

    /// Show time recorded but not yet committed.
    Status {
        /// Print only the total.
        #[arg(long)]
        total_only: bool,

        /// Output as JSON.
        #[arg(long, conflicts_with = "total_only")]
        json: bool,
    },

    /// Show the time recorded on a commit.
    Report {
        /// Commit to report on.
        #[arg(default_value = "HEAD")]
        rev: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
