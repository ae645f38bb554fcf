//! logscope CLI -- search clustered server logs for keywords
//!
//! ```text
//! logscope [-c logscope.toml] [--log-level L] [--output text|json] <COMMAND>
//!   search <env> <cluster> <server|all> <log_type> <keywords> [all|any] [--report [PATH]]
//!   targets
//!   config validate
//!   config show [--section NAME]
//! ```

mod cli;
mod commands;
mod error;
mod logging;
mod output;
mod report;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;

use logscope_core::config::{GeneralConfig, LogscopeConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let log_level = cli.log_level.as_deref();

    match cli.command {
        Commands::Config(args) => {
            // Must work even when the config file itself is broken.
            init_logging(&GeneralConfig::default(), log_level)?;
            commands::config::execute(args, &cli.config, &writer).await
        }
        Commands::Search(args) => {
            let config = load_config(&cli.config, log_level).await?;
            commands::search::execute(args, config, &writer).await
        }
        Commands::Targets => {
            let config = load_config(&cli.config, log_level).await?;
            commands::targets::execute(config, &writer).await
        }
    }
}

/// Load the configuration, apply the `--log-level` override, and start logging.
async fn load_config(
    path: &Path,
    log_level: Option<&str>,
) -> Result<Arc<LogscopeConfig>, CliError> {
    let mut config = LogscopeConfig::load(path).await?;
    if let Some(level) = log_level {
        config.general.log_level = level.to_owned();
    }
    init_logging(&config.general, None)?;
    logscope_core::metrics::describe_all();

    tracing::info!(config = %path.display(), "logscope starting");
    Ok(Arc::new(config))
}

fn init_logging(general: &GeneralConfig, log_level: Option<&str>) -> Result<(), CliError> {
    let mut general = general.clone();
    if let Some(level) = log_level {
        general.log_level = level.to_owned();
    }
    logging::init_tracing(&general).map_err(|e| CliError::Config(e.to_string()))
}
