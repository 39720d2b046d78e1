//! `sqlreport render`

use super::input::{load_report, read_params};
use anyhow::Result;
use sqlreport_sql::{ReadOnlyQueryGuard, SqlTemplateEngine, check_consistency};
use std::path::Path;

pub fn run(report_path: &Path, params_path: Option<&Path>, lenient: bool) -> Result<()> {
    let report = load_report(report_path)?;
    let params = read_params(params_path)?;
    let template = report.sql.trim();

    ReadOnlyQueryGuard::require_read_only(template)?;
    for problem in check_consistency(template, &report.variables) {
        tracing::warn!(report = %report.name, "{problem}");
    }

    let sql = SqlTemplateEngine::new().render(template, &report.variables, &params, !lenient)?;
    println!("{sql}");
    Ok(())
}
