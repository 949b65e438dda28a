//! Command line interface for radarmatch.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::config::StrategyKind;

/// radarmatch - validate compatibility scores and render radar charts.
#[derive(Parser, Debug)]
#[command(name = "radarmatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "radarmatch.toml")]
    pub config: PathBuf,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Writes a default configuration in the current directory.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Normalizes score files and reports the corrections.
    Validate {
        /// JSON score files, or `-` for stdin.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Renders a score file as a radar chart PNG.
    Render {
        /// JSON score file, or `-` for stdin.
        file: PathBuf,

        /// Where to write the PNG.
        #[arg(short, long)]
        output: PathBuf,

        /// Render strategy (auto, inline, worker).
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
    },

    /// Re-validates every score stored in the SQLite store.
    #[cfg(feature = "sqlite")]
    Repair {
        /// Database path (default: storage.db_path from the config).
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Shows version.
    Version,
}
