//! Loading command inputs from YAML or JSON files.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlreport_core::{ReportDefinition, ValidationError, VariableInput, normalize_variables};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Read a document. `.json` files are parsed as JSON, everything else as YAML.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {}", path.display()))
    }
}

/// Parameter object, empty when no file is given.
pub fn read_params(path: Option<&Path>) -> Result<Map<String, Value>> {
    match path {
        Some(path) => read_document(path),
        None => Ok(Map::new()),
    }
}

/// A report as written by hand: variables are editor input and get
/// normalized on load.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFile {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub sql: String,
    #[serde(default)]
    pub variables: Vec<VariableInput>,
}

impl ReportFile {
    pub fn into_definition(self) -> Result<ReportDefinition, ValidationError> {
        Ok(ReportDefinition {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name.trim().to_string(),
            sql: self.sql,
            variables: normalize_variables(&self.variables)?,
        })
    }
}

pub fn load_report(path: &Path) -> Result<ReportDefinition> {
    let file: ReportFile = read_document(path)?;
    file.into_definition()
        .with_context(|| format!("Invalid report definition in {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
