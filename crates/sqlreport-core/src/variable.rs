//! Report variable definitions.
//!
//! A [`VariableInput`] is what an editor submits; [`normalize_variables`]
//! turns a list of them into [`VariableDefinition`]s, the only form the
//! renderer accepts.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Closed set of placeholder types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Date,
    Datetime,
    Boolean,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "string",
            VariableType::Number => "number",
            VariableType::Date => "date",
            VariableType::Datetime => "datetime",
            VariableType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "string" => Ok(VariableType::String),
            "number" => Ok(VariableType::Number),
            "date" => Ok(VariableType::Date),
            "datetime" => Ok(VariableType::Datetime),
            "boolean" => Ok(VariableType::Boolean),
            _ => Err(ValidationError::invalid_variable_type(&normalized)),
        }
    }
}

/// A normalized, typed template variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    /// Placeholder name, referenced as `:key` in the template.
    pub key: String,
    /// Display text.
    pub label: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    #[serde(default = "default_true")]
    pub required: bool,
    /// Accepts a list, rendered as a parenthesized `IN` list.
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Read-only SQL that populates a choice list for this variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options_query: Option<String>,
    #[serde(default)]
    pub order_index: u32,
}

impl VariableDefinition {
    /// A required, single-value variable labelled with its own key.
    pub fn new(key: impl Into<String>, var_type: VariableType) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            var_type,
            required: true,
            multiple: false,
            default_value: None,
            options_query: None,
            order_index: 0,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_options_query(mut self, query: impl Into<String>) -> Self {
        self.options_query = Some(query.into());
        self
    }

    /// Default value, ignoring blank strings.
    pub fn effective_default(&self) -> Option<&str> {
        self.default_value
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

/// A variable as submitted by an editor, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableInput {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub var_type: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub options_query: Option<String>,
    #[serde(default)]
    pub order_index: Option<u32>,
}

/// Normalize editor input into variable definitions.
///
/// Keys, labels and types are trimmed, types are parsed against the closed set,
/// keys must be identifiers and unique ignoring case, and blank defaults or
/// options queries become `None`. The result is ordered by `order_index`,
/// which falls back to the input position.
pub fn normalize_variables(
    inputs: &[VariableInput],
) -> Result<Vec<VariableDefinition>, ValidationError> {
    let mut seen = HashSet::new();
    let mut variables = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.iter().enumerate() {
        let key = input.key.trim();
        let var_type: VariableType = input.var_type.parse()?;
        if !is_identifier(key) {
            return Err(ValidationError::invalid_variable_key(key));
        }
        if !seen.insert(key.to_lowercase()) {
            return Err(ValidationError::duplicate_variable(key));
        }

        variables.push(VariableDefinition {
            key: key.to_string(),
            label: input.label.trim().to_string(),
            var_type,
            required: input.required,
            multiple: input.multiple,
            default_value: non_blank(input.default_value.as_deref()),
            options_query: non_blank(input.options_query.as_deref()),
            order_index: input.order_index.unwrap_or(index as u32),
        });
    }

    variables.sort_by_key(|variable| variable.order_index);
    Ok(variables)
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn default_true() -> bool {
    true
}
