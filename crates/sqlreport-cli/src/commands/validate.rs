//! `sqlreport validate`

use super::input::{print_json, read_document};
use anyhow::Result;
use sqlreport_core::SqlReportConfig;
use sqlreport_runtime::{
    DefinitionValidationRequest, HttpSqlExecutor, ReportOrchestrator, UpstreamContext,
};
use std::path::Path;
use std::sync::Arc;

pub async fn run(
    config: &SqlReportConfig,
    file: &Path,
    syntax: bool,
    authorization: Option<&str>,
) -> Result<()> {
    let mut request: DefinitionValidationRequest = read_document(file)?;
    request.validate_syntax |= syntax;

    let ctx = if request.validate_syntax {
        match UpstreamContext::from_config(&config.upstream, authorization) {
            Ok(ctx) => Some(ctx),
            Err(err) => {
                tracing::warn!(error = %err, "Executor unavailable for syntax check");
                None
            }
        }
    } else {
        None
    };

    let executor = Arc::new(HttpSqlExecutor::from_config(&config.upstream)?);
    let orchestrator = ReportOrchestrator::new(config, executor);
    let report = orchestrator.validate_definition(&request, ctx.as_ref()).await;

    print_json(&report)?;
    if !report.valid {
        anyhow::bail!("report definition has {} problem(s)", report.errors.len());
    }
    Ok(())
}
