//! Report definition validation.
//!
//! Unlike [`ReportOrchestrator::prepare`](crate::ReportOrchestrator::prepare),
//! which stops at the first problem, validation collects every problem it can
//! find so an editor can show them together.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlreport_core::{ValidationError, VariableInput, normalize_variables};
use sqlreport_sql::{ReadOnlyQueryGuard, SqlTemplateEngine, check_consistency};

/// A report definition as submitted by an editor, before saving.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionValidationRequest {
    pub sql: String,

    #[serde(default)]
    pub variables: Vec<VariableInput>,

    /// Sample parameters for the trial render.
    #[serde(default)]
    pub params: Map<String, Value>,

    #[serde(default = "default_true")]
    pub enforce_read_only: bool,

    #[serde(default)]
    pub enforce_required: bool,

    /// Also run `EXPLAIN <rendered>` against the executor.
    #[serde(default)]
    pub validate_syntax: bool,
}

impl DefinitionValidationRequest {
    pub fn new(sql: impl Into<String>, variables: Vec<VariableInput>) -> Self {
        Self {
            sql: sql.into(),
            variables,
            params: Map::new(),
            enforce_read_only: true,
            enforce_required: false,
            validate_syntax: false,
        }
    }
}

/// Outcome of validating a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_query: Option<String>,
}

impl DefinitionValidation {
    pub(crate) fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.valid = false;
    }
}

/// Check a definition without touching the executor.
///
/// Collects, in order: variable normalization failures, blank SQL (which
/// ends the check), read-only violations when `enforce_read_only`, unknown
/// placeholders and `IN` misuse, then any trial render failure.
pub fn validate_definition(request: &DefinitionValidationRequest) -> DefinitionValidation {
    let mut errors = Vec::new();
    let template = request.sql.trim();

    let variables = normalize_variables(&request.variables).unwrap_or_else(|e| {
        errors.push(e.message);
        Vec::new()
    });

    if template.is_empty() {
        errors.push(ValidationError::empty_sql().message);
        return DefinitionValidation {
            valid: false,
            errors,
            rendered_query: None,
        };
    }

    if request.enforce_read_only
        && let Some(err) = ReadOnlyQueryGuard::validate(template)
    {
        errors.push(err.message);
    }

    errors.extend(check_consistency(template, &variables).into_iter().map(|e| e.message));

    let rendered_query = match SqlTemplateEngine::new().render(
        template,
        &variables,
        &request.params,
        request.enforce_required,
    ) {
        Ok(sql) => Some(sql),
        Err(err) => {
            errors.push(err.message);
            None
        }
    };

    DefinitionValidation {
        valid: errors.is_empty() && rendered_query.is_some(),
        errors,
        rendered_query,
    }
}

fn default_true() -> bool {
    true
}
