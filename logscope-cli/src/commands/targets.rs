//! `logscope targets` command handler

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use logscope_core::config::LogscopeConfig;
use logscope_search::{TargetOption, TopologyResolver};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `targets` command.
pub async fn execute(config: Arc<LogscopeConfig>, writer: &OutputWriter) -> Result<(), CliError> {
    let resolver = TopologyResolver::new(config);
    let report = TargetsReport {
        targets: resolver.target_options(),
    };
    writer.render(&report)?;
    Ok(())
}

/// Selectable search targets, one `env:machine:cluster:server` entry each.
#[derive(Serialize)]
pub struct TargetsReport {
    pub targets: Vec<TargetOption>,
}

impl Render for TargetsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.targets.is_empty() {
            writeln!(w, "No targets configured")?;
            return Ok(());
        }
        for option in &self.targets {
            writeln!(w, "{option}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPOLOGY: &str = r#"
[log_files]
path_template = "/logs/$cluster/"

[[environments]]
name = "itg"
machines = ["host-a"]

[[machines]]
name = "host-a"
[[machines.clusters]]
name = "cluster1"
servers = ["s1", "s2"]
"#;

    fn report() -> TargetsReport {
        let config = Arc::new(LogscopeConfig::parse(TOPOLOGY).expect("config parses"));
        TargetsReport {
            targets: TopologyResolver::new(config).target_options(),
        }
    }

    #[test]
    fn test_targets_text_lists_all_entry_first() {
        let mut buffer = Vec::new();
        report().render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec!["itg:all:cluster1:all", "itg:host-a:cluster1:s1", "itg:host-a:cluster1:s2"]
        );
    }

    #[test]
    fn test_targets_json_uses_option_strings() {
        let json = serde_json::to_value(report()).expect("serializable");
        assert_eq!(json["targets"][0], "itg:all:cluster1:all");
        assert_eq!(json["targets"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_targets_empty_topology() {
        let report = TargetsReport {
            targets: Vec::new(),
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        assert!(String::from_utf8(buffer).expect("utf8").contains("No targets configured"));
    }
}
