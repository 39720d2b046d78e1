use crate::error::ReportError;
use crate::executor::SqlExecutor;
use crate::options::{VariableOption, VariableOptionsRequest, extract_options};
use crate::tabular::{ColumnSummary, TabularResult, column_sums};
use crate::upstream::UpstreamContext;
use crate::validation::{DefinitionValidation, DefinitionValidationRequest, validate_definition};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlreport_core::{
    AccessAction, Principal, ReportDefinition, ReportsConfig, Resource, SqlReportConfig,
    ValidationError, VariableDefinition,
};
use sqlreport_policy::AccessControlResolver;
use sqlreport_sql::{ReadOnlyQueryGuard, SqlTemplateEngine};
use std::sync::Arc;
use std::time::Instant;

/// Run metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMeta {
    pub environment: String,
    pub generated_at: DateTime<Utc>,
    /// Rows returned by the executor, before truncation.
    pub row_count: usize,
    pub elapsed_ms: u64,
    pub truncated: bool,
}

/// Result of running a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRun {
    pub name: String,
    pub meta: RunMeta,
    /// The rendered SQL that was executed.
    pub query: String,
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    /// Computed over all rows, including truncated ones.
    pub summaries: Vec<ColumnSummary>,
}

/// Sequences access control, the read-only guard and template rendering,
/// then hands the rendered SQL to a [`SqlExecutor`].
///
/// Holds no per-call state; every call is independent and may run
/// concurrently with any other.
pub struct ReportOrchestrator {
    resolver: AccessControlResolver,
    engine: SqlTemplateEngine,
    executor: Arc<dyn SqlExecutor>,
    environment: String,
    limits: ReportsConfig,
}

impl ReportOrchestrator {
    pub fn new(config: &SqlReportConfig, executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            resolver: AccessControlResolver::from_config(&config.security),
            engine: SqlTemplateEngine::new(),
            executor,
            environment: config.environment.clone(),
            limits: config.reports.clone(),
        }
    }

    pub fn resolver(&self) -> &AccessControlResolver {
        &self.resolver
    }

    /// Fail with [`ReportError::Forbidden`] unless `principal` may perform
    /// `action` on `resource`.
    pub fn authorize(
        &self,
        principal: &Principal,
        resource: &Resource,
        action: AccessAction,
    ) -> Result<(), ReportError> {
        let decision = self.resolver.decide(principal, resource, action);
        if decision.allowed {
            return Ok(());
        }
        tracing::warn!(
            user_id = %principal.user_id(),
            resource_kind = resource.kind(),
            resource_id = %resource.id(),
            action = %action,
            "Access denied"
        );
        Err(ReportError::Forbidden)
    }

    /// Authorize, re-check the template is read-only and render it with
    /// required parameters enforced. Returns the SQL to execute.
    pub fn prepare(
        &self,
        principal: &Principal,
        resource: &Resource,
        action: AccessAction,
        template: &str,
        variables: &[VariableDefinition],
        params: &Map<String, Value>,
    ) -> Result<String, ReportError> {
        self.authorize(principal, resource, action)?;

        let template = template.trim();
        ReadOnlyQueryGuard::require_read_only(template)?;
        let sql = self.engine.render(template, variables, params, true)?;

        tracing::debug!(sql = %sql, "Prepared report query");
        Ok(sql)
    }

    /// Prepare `report` for RUN, execute it and shape the result.
    ///
    /// Rows beyond `reports.max_rows` are dropped and the run is marked
    /// truncated. Column sums always cover every row.
    pub async fn run(
        &self,
        ctx: &UpstreamContext,
        principal: &Principal,
        report: &ReportDefinition,
        resource: &Resource,
        params: &Map<String, Value>,
    ) -> Result<ReportRun, ReportError> {
        let query = self.prepare(
            principal,
            resource,
            AccessAction::Run,
            &report.sql,
            &report.variables,
            params,
        )?;

        let started = Instant::now();
        let payload = self.execute(ctx, &query).await?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (columns, records) = match TabularResult::from_payload(&payload) {
            Some(table) => (table.columns.clone(), table.into_records()),
            None => (Vec::new(), Vec::new()),
        };
        let summaries = column_sums(&columns, &records);

        let row_count = records.len();
        let max_rows = self.limits.max_rows;
        let truncated = row_count > max_rows;
        let mut rows = records;
        rows.truncate(max_rows);

        tracing::info!(
            report_id = %report.id,
            user_id = %principal.user_id(),
            row_count,
            truncated,
            elapsed_ms,
            "Report executed"
        );

        Ok(ReportRun {
            name: report.name.clone(),
            meta: RunMeta {
                environment: self.environment.clone(),
                generated_at: Utc::now(),
                row_count,
                elapsed_ms,
                truncated,
            },
            query,
            columns,
            rows,
            summaries,
        })
    }

    /// List the selectable values of one of `report`'s variables.
    ///
    /// Requires RUN on the report. The variable key is matched ignoring case.
    /// Its options query is rendered with the report's variables without
    /// enforcing required ones. `limit` defaults to `reports.options_limit`
    /// and is clamped to `1..=reports.max_rows`.
    pub async fn list_variable_options(
        &self,
        ctx: &UpstreamContext,
        principal: &Principal,
        report: &ReportDefinition,
        resource: &Resource,
        variable_key: &str,
        request: &VariableOptionsRequest,
    ) -> Result<Vec<VariableOption>, ReportError> {
        self.authorize(principal, resource, AccessAction::Run)?;

        let variable = report
            .find_variable(variable_key)
            .ok_or_else(|| ValidationError::unknown_variable(variable_key))?;
        let query = ReadOnlyQueryGuard::normalize_options_query(
            &variable.key,
            variable.options_query.as_deref(),
        )?;
        let sql = self
            .engine
            .render(&query, &report.variables, &request.params, false)?;

        let payload = self.execute(ctx, &sql).await?;
        let limit = request
            .limit
            .unwrap_or(self.limits.options_limit)
            .clamp(1, self.limits.max_rows.max(1));
        Ok(extract_options(&payload, limit)?)
    }

    /// Validate a definition, then optionally ask the database to `EXPLAIN`
    /// the rendered query.
    ///
    /// The syntax check only runs when everything else passed. It needs
    /// `ctx`; without one the check is reported as an error.
    pub async fn validate_definition(
        &self,
        request: &DefinitionValidationRequest,
        ctx: Option<&UpstreamContext>,
    ) -> DefinitionValidation {
        let mut report = validate_definition(request);
        if !request.validate_syntax || !report.valid {
            return report;
        }
        let Some(rendered) = report.rendered_query.clone() else {
            return report;
        };

        match ctx {
            Some(ctx) => {
                if let Err(err) = self.execute(ctx, &format!("EXPLAIN {rendered}")).await {
                    report.push_error(format!("Database rejected the query: {err}"));
                }
            }
            None => report.push_error("Syntax check requested but no SQL executor is configured"),
        }
        report
    }

    async fn execute(&self, ctx: &UpstreamContext, sql: &str) -> Result<Value, ReportError> {
        self.executor
            .execute(ctx, sql)
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "SQL executor call failed"))
            .map_err(ReportError::from)
    }
}
