//! CLI argument parsing

use crate::config::{OutputFormat, TierChoice};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Extract code structure and classify files into architectural roles
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Extract code structure and classify files into architectural roles")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Whether the chosen command asked for verbose output
    pub fn verbose(&self) -> bool {
        match &self.command {
            Command::Analyze { verbose, .. } => *verbose,
            _ => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a project and report every file's structure and role
    Analyze {
        /// Path to the project to scan
        path: PathBuf,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file path (defaults to ./strata.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Heuristic tier for C# files
        #[arg(long, value_enum)]
        tier: Option<TierArg>,

        /// Files handled per batch
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Only process high-priority files
        #[arg(long)]
        priority_only: bool,

        /// Stop after this many files
        #[arg(long)]
        max_files: Option<usize>,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Count source files by language and priority without reading them
    Survey {
        /// Path to the project
        path: PathBuf,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the role, deciding signal and priority of one file
    Classify {
        /// File to classify
        file: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    Summary,
    Layout,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Summary => OutputFormat::Summary,
            FormatArg::Layout => OutputFormat::Layout,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TierArg {
    Auto,
    Minimal,
    Partial,
    Full,
}

impl From<TierArg> for TierChoice {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Auto => TierChoice::Auto,
            TierArg::Minimal => TierChoice::Minimal,
            TierArg::Partial => TierChoice::Partial,
            TierArg::Full => TierChoice::Full,
        }
    }
}
