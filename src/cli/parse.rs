//! CLI parse: clap types for Reelcraft. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reelcraft CLI - Turn educational videos into interactive learning apps
#[derive(Parser)]
#[command(name = "reelcraft")]
#[command(about = "Generate a learning-app spec and a single-file HTML app from a video")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a spec and an app from a video
    Generate {
        /// Video URL (the content basis)
        video_url: String,
        /// Directory for spec.md and index.html
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Regenerate only the app from an edited spec
    Regenerate {
        /// Directory holding a previous spec.md and index.html
        #[arg(long)]
        from: PathBuf,
        /// File with the edited spec
        #[arg(long)]
        spec_file: PathBuf,
        /// Video URL the spec was made from
        #[arg(long)]
        video: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the example catalog
    Examples {
        /// Catalog file (overrides catalog.path from config)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
