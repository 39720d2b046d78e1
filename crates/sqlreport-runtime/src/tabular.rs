//! Conversion of executor payloads into columns and rows.

use serde::Serialize;
use serde_json::{Map, Value};

/// Column-ordered view of an executor payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Sum of a numeric column over every row of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub sum: f64,
}

impl TabularResult {
    /// Read `payload["data"]`.
    ///
    /// Columns come from the first row: its keys when rows are objects, or
    /// `col_1..col_n` when rows are arrays. Rows of any other shape are
    /// dropped. Returns `None` when there are no columns or no rows.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let data = payload.get("data")?.as_array()?;

        let columns: Vec<String> = match data.first()? {
            Value::Object(first) => first.keys().cloned().collect(),
            Value::Array(first) => (1..=first.len()).map(|i| format!("col_{i}")).collect(),
            _ => Vec::new(),
        };
        if columns.is_empty() {
            return None;
        }

        let rows: Vec<Vec<Value>> = data
            .iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(
                    columns
                        .iter()
                        .map(|c| map.get(c).cloned().unwrap_or(Value::Null))
                        .collect(),
                ),
                Value::Array(items) => Some(items.clone()),
                _ => None,
            })
            .collect();
        if rows.is_empty() {
            return None;
        }

        Some(Self { columns, rows })
    }

    /// Rows keyed by column name. Extra trailing cells in array rows are
    /// ignored.
    pub fn into_records(self) -> Vec<Map<String, Value>> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }
}

/// Sums for every column whose non-null values are all numbers, with at
/// least one present.
pub fn column_sums(columns: &[String], records: &[Map<String, Value>]) -> Vec<ColumnSummary> {
    columns
        .iter()
        .filter_map(|column| {
            let mut sum = 0.0;
            let mut seen = false;
            for value in records.iter().filter_map(|r| r.get(column)) {
                match value {
                    Value::Null => continue,
                    Value::Number(n) => {
                        sum += n.as_f64()?;
                        seen = true;
                    }
                    _ => return None,
                }
            }
            seen.then(|| ColumnSummary {
                column: column.clone(),
                sum,
            })
        })
        .collect()
}
