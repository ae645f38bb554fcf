//! `logscope config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logscope_core::config::{EnvironmentConfig, LogTypeConfig, LogscopeConfig, MachineConfig};

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
const SECTIONS: &[&str] = &[
    "general",
    "search",
    "log_files",
    "output",
    "topology",
    "log_types",
];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load and validate the configuration file, reporting any errors.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails (missing fields, invalid values, parse errors).
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match LogscopeConfig::load(config_path).await {
        Ok(config) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
            environments: config.environments.len(),
            log_types: config.log_types.len(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
            environments: 0,
            log_types: 0,
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Show the effective configuration (file + env overrides + defaults).
///
/// # Errors
///
/// Returns `CliError::Core` if loading fails or `CliError::Command` if the section name is invalid.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = LogscopeConfig::load(config_path).await?;
    let config_toml = match section.as_deref() {
        None => to_toml(&config),
        Some(name) => section_toml(&config, name)?,
    };

    writer.render(&ConfigReport {
        source: config_path.display().to_string(),
        section,
        config_toml,
    })?;

    Ok(())
}

#[derive(Serialize)]
struct TopologySection<'a> {
    environments: &'a [EnvironmentConfig],
    machines: &'a [MachineConfig],
}

#[derive(Serialize)]
struct LogTypesSection<'a> {
    log_types: &'a [LogTypeConfig],
}

fn section_toml(config: &LogscopeConfig, name: &str) -> Result<String, CliError> {
    let rendered = match name {
        "general" => to_toml(&config.general),
        "search" => to_toml(&config.search),
        "log_files" => to_toml(&config.log_files),
        "output" => to_toml(&config.output),
        "topology" => to_toml(&TopologySection {
            environments: &config.environments,
            machines: &config.machines,
        }),
        "log_types" => to_toml(&LogTypesSection {
            log_types: &config.log_types,
        }),
        _ => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                name,
                SECTIONS.join(", ")
            )));
        }
    };
    Ok(rendered)
}

fn to_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {})", e))
}

/// Configuration display report.
///
/// The `config_toml` field is skipped during JSON serialization (only used for text rendering).
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Serialized TOML configuration
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
    /// Number of configured environments
    pub environments: usize,
    /// Number of configured log types
    pub log_types: usize,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
            writeln!(
                w,
                "  Environments: {}, log types: {}",
                self.environments, self.log_types
            )?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}
