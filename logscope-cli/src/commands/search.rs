//! `logscope search` command handler

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use logscope_core::config::LogscopeConfig;
use logscope_core::error::LogscopeError;
use logscope_core::types::{Criteria, SearchRequest};
use logscope_search::LogSearch;

use crate::cli::SearchArgs;
use crate::error::CliError;
use crate::output::OutputWriter;
use crate::report::{ReportLayout, SearchReport};

/// Execute the `search` command.
///
/// An empty result is not an error: it renders as
/// "No matching log records found" and exits with code 0.
pub async fn execute(
    args: SearchArgs,
    config: Arc<LogscopeConfig>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let request = build_request(&args)?;
    let engine = LogSearch::from_config(Arc::clone(&config))?;
    let log_type = engine.resolver().resolve_log_type(&request.log_type)?;
    let layout = ReportLayout::new(&config.output, &log_type.headers);

    let result = engine.search(&request).await?;
    let report = SearchReport::build(&request, &result, layout);
    writer.render(&report)?;

    if let Some(path) = args.report {
        let path = path.unwrap_or_else(|| config.output.report_path.clone().into());
        write_report(&report, &path).await?;
    }

    Ok(())
}

fn build_request(args: &SearchArgs) -> Result<SearchRequest, CliError> {
    let criteria: Criteria = args.criteria.parse().map_err(LogscopeError::from)?;
    let request = SearchRequest::new(
        args.environment.as_str(),
        args.cluster.as_str(),
        &args.server,
        args.log_type.as_str(),
        SearchRequest::parse_keywords(&args.keywords),
        criteria,
    )
    .map_err(LogscopeError::from)?;
    Ok(request)
}

async fn write_report(report: &SearchReport, path: &Path) -> Result<(), CliError> {
    if report.write_tsv(path).await? {
        info!(path = %path.display(), records = report.record_count(), "report written");
    } else {
        info!(path = %path.display(), "no records, report skipped");
    }
    Ok(())
}
