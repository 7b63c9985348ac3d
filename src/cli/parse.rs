//! CLI parse: clap types for loci. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// loci - turn technical material into an illustrated memory palace
#[derive(Parser)]
#[command(name = "loci")]
#[command(about = "Turn technical material into an illustrated memory palace")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
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
    /// Generate a memory palace and write it as a zip archive
    Build {
        /// Subject of the palace, e.g. "Krebs Cycle"
        #[arg(long)]
        theme: String,

        /// Technical content to memorize
        #[arg(long, required_unless_present = "content_file", conflicts_with = "content_file")]
        content: Option<String>,

        /// Read the technical content from a file
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// Visual style shared by every room, e.g. one listed by `loci styles`
        #[arg(long)]
        style: String,

        /// Directory for the archive (default: output.directory from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Include the Markdown blueprint (appended to text, a `blueprint` field in json)
        #[arg(long)]
        print: bool,

        /// Skip writing the archive
        #[arg(long)]
        no_archive: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List suggested visual styles
    Styles,
    /// Validate configuration and API key presence without calling any provider
    Check {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
