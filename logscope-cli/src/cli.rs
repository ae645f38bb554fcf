//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// logscope -- distributed log search across clustered servers.
///
/// Use `logscope <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logscope", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logscope.toml configuration file.
    #[arg(short, long, default_value = "logscope.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a log type across the servers of a cluster.
    Search(SearchArgs),

    /// List selectable env:machine:cluster:server targets.
    Targets,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- search ----

/// Search one log type for keywords.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Environment name (e.g. itg, prd).
    pub environment: String,

    /// Cluster name within the environment.
    pub cluster: String,

    /// Server name, or `all` for every server of the cluster.
    pub server: String,

    /// Log type name as configured in `[[log_types]]`.
    pub log_type: String,

    /// Comma-separated keywords (case-insensitive).
    pub keywords: String,

    /// Keyword combinator: `all` (AND) or `any` (OR).
    #[arg(default_value = "all")]
    pub criteria: String,

    /// Also write a tab-separated report file (default path from `[output]`).
    #[arg(long)]
    pub report: Option<Option<PathBuf>>,
}

// ---- config ----

/// Manage logscope configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, search, log_files, output, topology, log_types).
        #[arg(long)]
        section: Option<String>,
    },
}
