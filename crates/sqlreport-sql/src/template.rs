//! SQL template rendering.

use crate::literal::to_sql_literal;
use crate::placeholder::scan_placeholders;
use serde_json::{Map, Value};
use sqlreport_core::{ValidationError, VariableDefinition};
use std::borrow::Cow;
use std::collections::HashMap;

/// Renders SQL templates into literal SQL.
///
/// Rendering is a pure function of its inputs. Every placeholder is replaced
/// in a single pass over the template, so text inside a substituted literal is
/// never scanned again for placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlTemplateEngine;

impl SqlTemplateEngine {
    pub fn new() -> Self {
        Self
    }

    /// Render `template` with `params`.
    ///
    /// 1. Every parameter key must name a variable.
    /// 2. Each variable resolves to its parameter (null included), else its
    ///    non-blank default, else fails when required and `enforce_required`,
    ///    else null.
    /// 3. The resolved value is encoded per the variable's type.
    /// 4. Each `:key` occurrence is replaced by its literal. Placeholders with
    ///    no variable are left as written.
    pub fn render(
        &self,
        template: &str,
        variables: &[VariableDefinition],
        params: &Map<String, Value>,
        enforce_required: bool,
    ) -> Result<String, ValidationError> {
        let unknown: Vec<&str> = params
            .keys()
            .map(String::as_str)
            .filter(|key| !variables.iter().any(|v| v.key == *key))
            .collect();
        if !unknown.is_empty() {
            return Err(ValidationError::unknown_parameters(&unknown));
        }

        let mut literals: HashMap<&str, String> = HashMap::with_capacity(variables.len());
        for variable in variables {
            let value = resolve_value(variable, params, enforce_required)?;
            literals.insert(variable.key.as_str(), to_sql_literal(variable, &value)?);
        }

        let mut rendered = String::with_capacity(template.len());
        let mut cursor = 0;
        let mut substituted = 0usize;
        for placeholder in scan_placeholders(template) {
            if let Some(literal) = literals.get(placeholder.name) {
                rendered.push_str(&template[cursor..placeholder.start]);
                rendered.push_str(literal);
                cursor = placeholder.end;
                substituted += 1;
            }
        }
        rendered.push_str(&template[cursor..]);

        tracing::debug!(
            variables = variables.len(),
            substituted,
            "Rendered SQL template"
        );
        Ok(rendered)
    }
}

fn resolve_value<'a>(
    variable: &VariableDefinition,
    params: &'a Map<String, Value>,
    enforce_required: bool,
) -> Result<Cow<'a, Value>, ValidationError> {
    if let Some(value) = params.get(&variable.key) {
        return Ok(Cow::Borrowed(value));
    }
    if let Some(default) = variable.effective_default() {
        return Ok(Cow::Owned(Value::String(default.to_string())));
    }
    if variable.required && enforce_required {
        return Err(ValidationError::missing_required(&variable.key));
    }
    Ok(Cow::Owned(Value::Null))
}
