use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};
use sqlreport_core::{
    AccessAction, AclEntry, FolderAcl, Grants, Principal, ReportAcl, ReportDefinition,
    ReportsConfig, Resource, SecurityConfig, SqlReportConfig, Subject, VariableDefinition,
    VariableType,
};
use sqlreport_runtime::{
    DefinitionValidationRequest, FailureClass, ReportError, ReportOrchestrator, SqlExecutor,
    UpstreamContext, UpstreamError, VariableOption, VariableOptionsRequest,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Executor that records every query and answers with a canned payload.
struct MemoryExecutor {
    response: Result<Value, String>,
    queries: Mutex<Vec<String>>,
}

impl MemoryExecutor {
    fn returning(payload: Value) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(payload),
            queries: Mutex::new(Vec::new()),
        })
    }

    fn failing(body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err(body.to_string()),
            queries: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for MemoryExecutor {
    async fn execute(&self, _ctx: &UpstreamContext, sql: &str) -> Result<Value, UpstreamError> {
        self.queries.lock().unwrap().push(sql.to_string());
        match &self.response {
            Ok(payload) => Ok(payload.clone()),
            Err(body) => Err(UpstreamError::Status {
                status: 500,
                content_type: Some("text/plain".to_string()),
                preview: body.clone(),
            }),
        }
    }
}

fn ctx() -> UpstreamContext {
    UpstreamContext::new("https://db.internal/sql/exec/", "Bearer test")
}

fn config(max_rows: usize, default_deny: bool) -> SqlReportConfig {
    SqlReportConfig {
        environment: "Test".to_string(),
        reports: ReportsConfig {
            max_rows,
            ..ReportsConfig::default()
        },
        security: SecurityConfig {
            acl_default_deny: default_deny,
        },
        ..SqlReportConfig::default()
    }
}

fn analyst() -> Principal {
    Principal::new(Uuid::new_v4(), "analyst@example.com", ["ANALYST"])
}

fn orders_report() -> ReportDefinition {
    ReportDefinition {
        id: Uuid::new_v4(),
        name: "Orders by status".to_string(),
        sql: "SELECT id, status, amount FROM orders WHERE status IN :status;".to_string(),
        variables: vec![
            VariableDefinition::new("status", VariableType::String)
                .multiple()
                .with_options_query("SELECT code AS value, name AS label FROM statuses;"),
        ],
    }
}

fn open_resource(report: &ReportDefinition) -> Resource {
    Resource::Report(ReportAcl {
        report_id: report.id,
        entries: vec![],
        folder: None,
    })
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_run_renders_executes_and_shapes_rows() {
    let executor = MemoryExecutor::returning(json!({"data": [
        {"id": 1, "status": "OPEN", "amount": 10.5},
        {"id": 2, "status": "OPEN", "amount": 4.5},
        {"id": 3, "status": "CLOSED", "amount": null},
    ]}));
    let orchestrator = ReportOrchestrator::new(&config(2, false), executor.clone());
    let report = orders_report();

    let run = orchestrator
        .run(
            &ctx(),
            &analyst(),
            &report,
            &open_resource(&report),
            &params(json!({"status": ["OPEN", "CLOSED"]})),
        )
        .await
        .unwrap();

    assert_eq!(
        executor.queries(),
        vec!["SELECT id, status, amount FROM orders WHERE status IN ('OPEN', 'CLOSED');"]
    );
    assert_eq!(run.name, "Orders by status");
    assert_eq!(run.columns, vec!["id", "status", "amount"]);
    assert_eq!(run.rows.len(), 2);
    assert_eq!(run.meta.row_count, 3);
    assert!(run.meta.truncated);
    assert_eq!(run.meta.environment, "Test");

    let sums: Vec<(&str, f64)> = run
        .summaries
        .iter()
        .map(|s| (s.column.as_str(), s.sum))
        .collect();
    assert_eq!(sums, vec![("id", 6.0), ("amount", 15.0)]);
}

#[tokio::test]
async fn test_run_with_empty_result() {
    let executor = MemoryExecutor::returning(json!({"data": []}));
    let orchestrator = ReportOrchestrator::new(&config(10, false), executor);
    let report = orders_report();

    let run = orchestrator
        .run(&ctx(), &analyst(), &report, &open_resource(&report), &params(json!({"status": "OPEN"})))
        .await
        .unwrap();
    assert!(run.columns.is_empty());
    assert!(run.rows.is_empty());
    assert!(!run.meta.truncated);
}

#[tokio::test]
async fn test_denied_run_is_forbidden_and_never_executes() {
    let executor = MemoryExecutor::returning(json!({"data": []}));
    let orchestrator = ReportOrchestrator::new(&config(10, true), executor.clone());
    let report = orders_report();

    let err = orchestrator
        .run(&ctx(), &analyst(), &report, &open_resource(&report), &params(json!({"status": "OPEN"})))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureClass::Authorization);
    assert_eq!(err.to_string(), "Forbidden");
    assert!(executor.queries().is_empty());
}

#[tokio::test]
async fn test_folder_grant_allows_run() {
    let executor = MemoryExecutor::returning(json!({"data": [{"n": 1}]}));
    let orchestrator = ReportOrchestrator::new(&config(10, true), executor);
    let report = orders_report();
    let resource = Resource::Report(ReportAcl {
        report_id: report.id,
        entries: vec![],
        folder: Some(FolderAcl {
            folder_id: Uuid::new_v4(),
            entries: vec![AclEntry::new(Subject::role("ANALYST"), Grants::view_run())],
        }),
    });

    let run = orchestrator
        .run(&ctx(), &analyst(), &report, &resource, &params(json!({"status": "OPEN"})))
        .await
        .unwrap();
    assert_eq!(run.columns, vec!["n"]);
}

#[tokio::test]
async fn test_missing_parameter_is_validation_error() {
    let executor = MemoryExecutor::returning(json!({"data": []}));
    let orchestrator = ReportOrchestrator::new(&config(10, false), executor.clone());
    let report = orders_report();

    let err = orchestrator
        .run(&ctx(), &analyst(), &report, &open_resource(&report), &Map::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureClass::Validation);
    assert_eq!(err.to_string(), "Missing required parameter: 'status'");
    assert!(executor.queries().is_empty());
}

#[tokio::test]
async fn test_stored_write_template_is_rejected_at_use_time() {
    let executor = MemoryExecutor::returning(json!({"data": []}));
    let orchestrator = ReportOrchestrator::new(&config(10, false), executor.clone());
    let mut report = orders_report();
    report.sql = "DELETE FROM orders".to_string();
    report.variables.clear();

    let err = orchestrator
        .run(&ctx(), &analyst(), &report, &open_resource(&report), &Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::Validation(_)));
    assert!(executor.queries().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_is_its_own_class() {
    let executor = MemoryExecutor::failing("relation \"orders\" does not exist");
    let orchestrator = ReportOrchestrator::new(&config(10, false), executor);
    let report = orders_report();

    let err = orchestrator
        .run(&ctx(), &analyst(), &report, &open_resource(&report), &params(json!({"status": "OPEN"})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureClass::Upstream);
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn test_prepare_checks_requested_action() {
    let executor = MemoryExecutor::returning(json!({}));
    let orchestrator = ReportOrchestrator::new(&config(10, true), executor);
    let principal = analyst();
    let report = orders_report();
    let view_only = Grants {
        view: true,
        ..Grants::none()
    };
    let resource = Resource::Report(ReportAcl {
        report_id: report.id,
        entries: vec![AclEntry::new(Subject::user(principal.email()), view_only)],
        folder: None,
    });
    let status = params(json!({"status": "OPEN"}));

    let sql = orchestrator
        .prepare(&principal, &resource, AccessAction::View, &report.sql, &report.variables, &status)
        .unwrap();
    assert_eq!(sql, "SELECT id, status, amount FROM orders WHERE status IN ('OPEN');");

    let err = orchestrator
        .prepare(&principal, &resource, AccessAction::Run, &report.sql, &report.variables, &status)
        .unwrap_err();
    assert!(matches!(err, ReportError::Forbidden));
}

#[tokio::test]
async fn test_variable_options() {
    let executor = MemoryExecutor::returning(json!({"data": [
        {"value": "OPEN", "label": "Open"},
        {"value": "CLOSED", "label": "Closed"},
        {"value": "VOID", "label": "Void"},
    ]}));
    let orchestrator = ReportOrchestrator::new(&config(10, false), executor.clone());
    let report = orders_report();

    let options = orchestrator
        .list_variable_options(
            &ctx(),
            &analyst(),
            &report,
            &open_resource(&report),
            "STATUS",
            &VariableOptionsRequest {
                params: Map::new(),
                limit: Some(2),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        executor.queries(),
        vec!["SELECT code AS value, name AS label FROM statuses"]
    );
    assert_eq!(
        options,
        vec![
            VariableOption {
                value: json!("OPEN"),
                label: "Open".to_string()
            },
            VariableOption {
                value: json!("CLOSED"),
                label: "Closed".to_string()
            },
        ]
    );
}

async fn option_count(
    orchestrator: &ReportOrchestrator,
    report: &ReportDefinition,
    limit: Option<usize>,
) -> usize {
    let request = VariableOptionsRequest {
        params: Map::new(),
        limit,
    };
    orchestrator
        .list_variable_options(&ctx(), &analyst(), report, &open_resource(report), "status", &request)
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn test_variable_options_limit_is_clamped() {
    let rows: Vec<Value> = (0..5)
        .map(|i| json!({"value": i, "label": format!("#{i}")}))
        .collect();
    let executor = MemoryExecutor::returning(json!({ "data": rows }));
    let orchestrator = ReportOrchestrator::new(&config(3, false), executor);
    let report = orders_report();

    assert_eq!(option_count(&orchestrator, &report, Some(0)).await, 1);
    assert_eq!(option_count(&orchestrator, &report, Some(100)).await, 3);
    assert_eq!(option_count(&orchestrator, &report, None).await, 3);
}

#[tokio::test]
async fn test_variable_options_errors() {
    let executor = MemoryExecutor::returning(json!({"data": []}));
    let orchestrator = ReportOrchestrator::new(&config(10, false), executor.clone());
    let mut report = orders_report();
    report
        .variables
        .push(VariableDefinition::new("region", VariableType::String));
    let resource = open_resource(&report);
    let request = VariableOptionsRequest::default();

    let err = orchestrator
        .list_variable_options(&ctx(), &analyst(), &report, &resource, "nope", &request)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Variable 'nope' not found");

    let err = orchestrator
        .list_variable_options(&ctx(), &analyst(), &report, &resource, "region", &request)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureClass::Validation);
    assert!(executor.queries().is_empty());
}

#[tokio::test]
async fn test_validate_definition_with_syntax_check() {
    let executor = MemoryExecutor::returning(json!({"data": [{"QUERY PLAN": "Seq Scan"}]}));
    let orchestrator = ReportOrchestrator::new(&config(10, false), executor.clone());
    let mut request = DefinitionValidationRequest::new("SELECT * FROM orders", vec![]);
    request.validate_syntax = true;

    let report = orchestrator.validate_definition(&request, Some(&ctx())).await;
    assert!(report.valid);
    assert_eq!(executor.queries(), vec!["EXPLAIN SELECT * FROM orders"]);

    let report = orchestrator.validate_definition(&request, None).await;
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
}

#[tokio::test]
async fn test_validate_definition_reports_database_error() {
    let executor = MemoryExecutor::failing("syntax error at or near \"FORM\"");
    let orchestrator = ReportOrchestrator::new(&config(10, false), executor);
    let mut request = DefinitionValidationRequest::new("SELECT * FORM orders", vec![]);
    request.validate_syntax = true;

    let report = orchestrator.validate_definition(&request, Some(&ctx())).await;
    assert!(!report.valid);
    assert!(report.errors[0].contains("syntax error at or near"));
    assert_eq!(report.rendered_query.as_deref(), Some("SELECT * FORM orders"));
}
