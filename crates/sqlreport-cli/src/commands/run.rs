//! `sqlreport run` and `sqlreport options`

use super::input::{load_report, print_json, read_document, read_params};
use anyhow::Result;
use serde_json::{Map, Value};
use sqlreport_core::{Principal, ReportAcl, ReportDefinition, Resource, SqlReportConfig};
use sqlreport_runtime::{
    FailureClass, HttpSqlExecutor, ReportError, ReportOrchestrator, UpstreamContext,
    VariableOptionsRequest,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Files describing one report invocation.
#[derive(Debug)]
pub struct ReportInputs {
    pub report: PathBuf,
    pub params: Option<PathBuf>,
    pub principal: PathBuf,
    pub resource: Option<PathBuf>,
}

struct Loaded {
    report: ReportDefinition,
    params: Map<String, Value>,
    principal: Principal,
    resource: Resource,
}

impl ReportInputs {
    fn load(&self) -> Result<Loaded> {
        let report = load_report(&self.report)?;
        let params = read_params(self.params.as_deref())?;
        let principal: Principal = read_document(&self.principal)?;
        let resource = match &self.resource {
            Some(path) => read_document(path)?,
            None => Resource::Report(ReportAcl {
                report_id: report.id,
                entries: Vec::new(),
                folder: None,
            }),
        };
        Ok(Loaded {
            report,
            params,
            principal,
            resource,
        })
    }
}

fn orchestrator(config: &SqlReportConfig) -> Result<ReportOrchestrator> {
    let executor = Arc::new(HttpSqlExecutor::from_config(&config.upstream)?);
    Ok(ReportOrchestrator::new(config, executor))
}

/// Keep the failure class visible in the CLI error.
fn describe(err: ReportError) -> anyhow::Error {
    let class = match err.kind() {
        FailureClass::Validation => "validation",
        FailureClass::Authorization => "authorization",
        FailureClass::Upstream => "upstream",
    };
    anyhow::anyhow!("{class} error: {err}")
}

pub async fn run(
    config: &SqlReportConfig,
    inputs: &ReportInputs,
    authorization: Option<&str>,
) -> Result<()> {
    let loaded = inputs.load()?;
    let ctx = UpstreamContext::from_config(&config.upstream, authorization)?;

    let result = orchestrator(config)?
        .run(
            &ctx,
            &loaded.principal,
            &loaded.report,
            &loaded.resource,
            &loaded.params,
        )
        .await
        .map_err(describe)?;
    print_json(&result)
}

pub async fn options(
    config: &SqlReportConfig,
    inputs: &ReportInputs,
    variable: &str,
    limit: Option<usize>,
    authorization: Option<&str>,
) -> Result<()> {
    let loaded = inputs.load()?;
    let ctx = UpstreamContext::from_config(&config.upstream, authorization)?;
    let request = VariableOptionsRequest {
        params: loaded.params,
        limit,
    };

    let options = orchestrator(config)?
        .list_variable_options(
            &ctx,
            &loaded.principal,
            &loaded.report,
            &loaded.resource,
            variable,
            &request,
        )
        .await
        .map_err(describe)?;
    print_json(&options)
}
