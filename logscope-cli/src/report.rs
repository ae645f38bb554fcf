//! Search result rendering: console tables, JSON payload, and TSV report file

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use logscope_core::config::OutputConfig;
use logscope_core::types::{SearchRequest, SearchResult, Target};

use crate::output::{Render, write_table};

/// Column headers used to lay out a search result.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    /// Target columns (environment, machine, cluster, server).
    pub fixed_headers: Vec<String>,
    /// Keyword count columns (keyword, count).
    pub count_headers: Vec<String>,
    /// Record field columns of the searched log type.
    pub log_headers: Vec<String>,
}

impl ReportLayout {
    /// Build a layout from the `[output]` section and a log type's headers.
    pub fn new(output: &OutputConfig, log_headers: &[String]) -> Self {
        Self {
            fixed_headers: output.fixed_headers.clone(),
            count_headers: output.count_headers.clone(),
            log_headers: log_headers.to_vec(),
        }
    }

    fn count_table_headers(&self) -> Vec<String> {
        self.fixed_headers
            .iter()
            .chain(&self.count_headers)
            .cloned()
            .collect()
    }

    fn data_table_headers(&self) -> Vec<String> {
        self.fixed_headers
            .iter()
            .chain(&self.log_headers)
            .cloned()
            .collect()
    }
}

/// Parameters the search was invoked with, echoed in the JSON payload.
#[derive(Debug, Clone, Serialize)]
pub struct InputParameters {
    pub environment: String,
    pub cluster: String,
    pub server: String,
    pub log_type: String,
    pub keywords: Vec<String>,
    pub criteria: String,
}

impl From<&SearchRequest> for InputParameters {
    fn from(request: &SearchRequest) -> Self {
        Self {
            environment: request.environment.clone(),
            cluster: request.cluster.clone(),
            server: request.server.to_string(),
            log_type: request.log_type.clone(),
            keywords: request.keywords.clone(),
            criteria: request.criteria.to_string(),
        }
    }
}

/// A target that failed under the partial failure policy.
#[derive(Debug, Clone, Serialize)]
pub struct FailedTarget {
    pub target: String,
    pub reason: String,
}

/// Rendered search result.
///
/// The JSON form is `{ input_parameters, log_count, log_data }` with every
/// row keyed by its column header. The text form prints the keyword count
/// table followed by the record table.
#[derive(Debug, Serialize)]
pub struct SearchReport {
    pub input_parameters: InputParameters,
    pub log_count: Vec<Map<String, Value>>,
    pub log_data: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_targets: Vec<FailedTarget>,

    #[serde(skip)]
    layout: ReportLayout,
    #[serde(skip)]
    count_rows: Vec<Vec<String>>,
    #[serde(skip)]
    data_rows: Vec<Vec<String>>,
}

impl SearchReport {
    /// Lay out a search result.
    ///
    /// Count rows are emitted per (target, keyword) with a non-zero count,
    /// record rows per record, both in the result's target order.
    pub fn build(request: &SearchRequest, result: &SearchResult, layout: ReportLayout) -> Self {
        let count_headers = layout.count_table_headers();
        let data_headers = layout.data_table_headers();

        let mut count_rows = Vec::new();
        let mut log_count = Vec::new();
        for (target, tally) in &result.tallies {
            for (keyword, count) in tally.entries() {
                if *count == 0 {
                    continue;
                }
                let mut json = fixed_object(&layout.fixed_headers, target);
                if let Some(header) = layout.count_headers.first() {
                    json.insert(header.clone(), Value::from(keyword.clone()));
                }
                if let Some(header) = layout.count_headers.get(1) {
                    json.insert(header.clone(), Value::from(*count));
                }
                log_count.push(json);

                let mut row = fixed_row(target);
                row.push(keyword.clone());
                row.push(count.to_string());
                row.truncate(count_headers.len());
                count_rows.push(row);
            }
        }

        let mut data_rows = Vec::new();
        let mut log_data = Vec::new();
        for (target, records) in &result.records {
            for record in records {
                let mut json = fixed_object(&layout.fixed_headers, target);
                for (header, value) in layout.log_headers.iter().zip(&record.fields) {
                    json.insert(header.clone(), Value::from(value.clone()));
                }
                log_data.push(json);

                let mut row = fixed_row(target);
                row.extend(record.fields.iter().cloned());
                row.truncate(data_headers.len());
                data_rows.push(row);
            }
        }

        let failed_targets = result
            .failures
            .iter()
            .map(|f| FailedTarget {
                target: f.target.to_string(),
                reason: f.reason.clone(),
            })
            .collect();

        Self {
            input_parameters: InputParameters::from(request),
            log_count,
            log_data,
            failed_targets,
            layout,
            count_rows,
            data_rows,
        }
    }

    /// Number of record rows.
    pub fn record_count(&self) -> usize {
        self.data_rows.len()
    }

    /// Write the tab-separated report file.
    ///
    /// One header row (fixed headers + log type headers), then one row per
    /// record. Nothing is written when there are no records; returns whether
    /// the file was written.
    pub async fn write_tsv(&self, path: &Path) -> std::io::Result<bool> {
        if self.data_rows.is_empty() {
            return Ok(false);
        }

        let mut content = self.layout.data_table_headers().join("\t");
        content.push('\n');
        for row in &self.data_rows {
            content.push_str(&row.join("\t"));
            content.push('\n');
        }
        tokio::fs::write(path, content).await?;
        Ok(true)
    }
}

fn fixed_row(target: &Target) -> Vec<String> {
    target
        .fixed_columns()
        .iter()
        .map(|c| (*c).to_owned())
        .collect()
}

fn fixed_object(headers: &[String], target: &Target) -> Map<String, Value> {
    headers
        .iter()
        .zip(target.fixed_columns())
        .map(|(h, v)| (h.clone(), Value::from(v)))
        .collect()
}

impl Render for SearchReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let params = &self.input_parameters;
        writeln!(
            w,
            "Search: {} {} {} {} [{}] ({})",
            params.environment.bold(),
            params.cluster,
            params.server,
            params.log_type,
            params.keywords.join(", "),
            params.criteria
        )?;
        writeln!(w)?;

        if self.data_rows.is_empty() {
            writeln!(w, "No matching log records found")?;
        } else {
            write_table(w, &self.layout.count_table_headers(), &self.count_rows)?;
            writeln!(w)?;
            write_table(w, &self.layout.data_table_headers(), &self.data_rows)?;
        }

        if !self.failed_targets.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", "Failed targets:".yellow().bold())?;
            for failed in &self.failed_targets {
                writeln!(w, "  {}: {}", failed.target, failed.reason.red())?;
            }
        }

        Ok(())
    }
}
