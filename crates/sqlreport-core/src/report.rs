//! Stored report definitions, as handed over by the persistence layer.

use crate::variable::VariableDefinition;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A report template and its variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinition {
    pub id: Uuid,
    pub name: String,
    /// SQL template with `:key` placeholders.
    pub sql: String,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
}

impl ReportDefinition {
    /// Variable lookup ignoring case, as used by option lists.
    pub fn find_variable(&self, key: &str) -> Option<&VariableDefinition> {
        self.variables
            .iter()
            .find(|variable| variable.key.eq_ignore_ascii_case(key))
    }
}
