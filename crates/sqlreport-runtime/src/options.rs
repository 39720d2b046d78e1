//! Variable option lists produced by a variable's options query.
//!
//! An options query returns exactly two columns, `value` and `label`
//! (matched case-insensitively). The Portuguese spellings `valor` and
//! `descricao` are accepted too. Each row becomes one [`VariableOption`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlreport_core::ValidationError;
use std::collections::BTreeSet;

pub const OPTION_VALUE_COLUMN: &str = "value";
pub const OPTION_LABEL_COLUMN: &str = "label";

const OPTION_VALUE_ALIASES: &[&str] = &[OPTION_VALUE_COLUMN, "valor"];
const OPTION_LABEL_ALIASES: &[&str] = &[OPTION_LABEL_COLUMN, "descricao"];

/// Keys that may carry a column name in a `description` entry.
const DESCRIPTION_NAME_KEYS: &[&str] = &["name", "column_name", "columnName", "field"];

/// Parameters for listing a variable's options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableOptionsRequest {
    /// Values for the report variables the options query references.
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Maximum options returned. Defaults to the configured options limit.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One selectable value for a report variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableOption {
    pub value: Value,
    pub label: String,
}

/// Map an executor payload to at most `limit` options.
///
/// With no rows, the column check still runs against the payload's
/// `description` when it names any columns.
pub fn extract_options(payload: &Value, limit: usize) -> Result<Vec<VariableOption>, ValidationError> {
    let rows = option_rows(payload)?;

    let Some(first) = rows.first() else {
        if let Some(columns) = description_columns(payload) {
            resolve_columns(columns.iter().map(String::as_str))?;
        }
        return Ok(Vec::new());
    };

    let (value_key, label_key) = resolve_columns(first.keys().map(String::as_str))?;
    let options = rows
        .iter()
        .take(limit)
        .map(|row| VariableOption {
            value: row.get(value_key).cloned().unwrap_or(Value::Null),
            label: label_text(row.get(label_key)),
        })
        .collect();
    Ok(options)
}

fn option_rows(payload: &Value) -> Result<Vec<&Map<String, Value>>, ValidationError> {
    let Some(data) = payload.get("data").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    data.iter()
        .enumerate()
        .map(|(i, row)| {
            row.as_object()
                .ok_or_else(|| ValidationError::malformed_option_row(i + 1))
        })
        .collect()
}

fn description_columns(payload: &Value) -> Option<BTreeSet<String>> {
    let description = payload.get("description")?.as_array()?;
    let names: BTreeSet<String> = description
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|column| {
            DESCRIPTION_NAME_KEYS
                .iter()
                .find_map(|key| column.get(*key).filter(|v| !v.is_null()))
        })
        .map(|name| match name {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    (!names.is_empty()).then_some(names)
}

/// Find the value and label columns among `columns`.
fn resolve_columns<'a, I>(columns: I) -> Result<(&'a str, &'a str), ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let columns: Vec<&str> = columns.into_iter().collect();
    let err = || ValidationError::option_columns(OPTION_VALUE_COLUMN, OPTION_LABEL_COLUMN);
    if columns.len() != 2 {
        return Err(err());
    }
    let find = |aliases: &[&str]| {
        columns
            .iter()
            .copied()
            .find(|c| aliases.iter().any(|alias| c.eq_ignore_ascii_case(alias)))
    };
    match (find(OPTION_VALUE_ALIASES), find(OPTION_LABEL_ALIASES)) {
        (Some(value), Some(label)) => Ok((value, label)),
        _ => Err(err()),
    }
}

fn label_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlreport_core::ValidationErrorKind;

    #[test]
    fn test_maps_rows_to_options() {
        let payload = json!({"data": [
            {"VALUE": 1, "Label": "Open"},
            {"VALUE": 2, "Label": null},
            {"VALUE": 3, "Label": 42},
        ]});
        let options = extract_options(&payload, 10).unwrap();
        assert_eq!(
            options,
            vec![
                VariableOption { value: json!(1), label: "Open".into() },
                VariableOption { value: json!(2), label: String::new() },
                VariableOption { value: json!(3), label: "42".into() },
            ]
        );
    }

    #[test]
    fn test_portuguese_column_names() {
        let payload = json!({"data": [{"VALOR": "SP", "Descricao": "Sao Paulo"}]});
        assert_eq!(
            extract_options(&payload, 10).unwrap(),
            vec![VariableOption { value: json!("SP"), label: "Sao Paulo".into() }]
        );

        let mixed = json!({"data": [{"valor": 1, "label": "One"}]});
        assert_eq!(extract_options(&mixed, 10).unwrap()[0].label, "One");

        let empty = json!({"data": [], "description": [{"name": "valor"}, {"name": "descricao"}]});
        assert!(extract_options(&empty, 10).unwrap().is_empty());

        let both_values = json!({"data": [{"value": 1, "valor": 2}]});
        assert!(extract_options(&both_values, 10).is_err());
    }

    #[test]
    fn test_limit_applies() {
        let payload = json!({"data": [
            {"value": "a", "label": "A"},
            {"value": "b", "label": "B"},
        ]});
        assert_eq!(extract_options(&payload, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_columns_rejected() {
        let three = json!({"data": [{"value": 1, "label": "a", "extra": 0}]});
        let err = extract_options(&three, 10).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::OptionsQuery);

        let renamed = json!({"data": [{"id": 1, "label": "a"}]});
        assert!(extract_options(&renamed, 10).is_err());
    }

    #[test]
    fn test_non_object_row_rejected() {
        let payload = json!({"data": [{"value": 1, "label": "a"}, [2, "b"]]});
        let err = extract_options(&payload, 10).unwrap_err();
        assert_eq!(err.message, "Row 2 of the options query is not an object");
    }

    #[test]
    fn test_empty_result_checks_description() {
        let ok = json!({"data": [], "description": [{"name": "value"}, {"column_name": "label"}]});
        assert!(extract_options(&ok, 10).unwrap().is_empty());

        let bad = json!({"data": [], "description": [{"name": "id"}, {"field": "label"}]});
        assert!(extract_options(&bad, 10).is_err());

        let unnamed = json!({"data": [], "description": [{"type": "int"}]});
        assert!(extract_options(&unnamed, 10).unwrap().is_empty());
    }
}
