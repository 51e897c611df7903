use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "intake")]
#[command(about = "Scan dropped folders and build an upload manifest", long_about = None)]
pub struct Cli {
    /// Increase log detail (-v debug, -vv trace); TRACING_LEVEL overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan paths and print the admitted tree and exclusion log
    Scan {
        #[command(flatten)]
        scan: ScanArgs,
        /// Write the exclusion log to a CSV file
        #[arg(long, value_name = "FILE")]
        excluded_csv: Option<PathBuf>,
    },
    /// Scan paths and print the flat file list for the selected folders
    Collect {
        #[command(flatten)]
        scan: ScanArgs,
        /// Folder path to include (repeatable); replaces the default of all folders
        #[arg(long = "select", value_name = "PATH")]
        select: Vec<String>,
        /// Select no folders, only files directly under each root
        #[arg(long, conflicts_with = "select")]
        none: bool,
        /// Print the manifest as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compile an ignore file and list its rules
    Patterns {
        /// Path to a .gitignore-style file
        file: PathBuf,
    },
    /// Print configuration values
    PrintConfig,
}

/// Per-invocation overrides on top of the loaded configuration.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Files or folders to scan, in drop order
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Comma-separated extension allow-list
    #[arg(long, value_delimiter = ',')]
    pub ext: Option<Vec<String>>,
    /// Maximum size of a single file in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_size: Option<u64>,
    /// Descend into hidden folders (version-control metadata stays excluded)
    #[arg(long)]
    pub include_hidden: bool,
}
