//! Read-only SQL classification.
//!
//! The guard is lexical, not a parser: it accepts exactly one statement that
//! starts with `SELECT` or `WITH` and contains none of the write keywords as
//! a whole word anywhere in its text, string literals included.

use regex::Regex;
use sqlreport_core::ValidationError;
use std::sync::LazyLock;

static WRITE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(insert|update|delete|drop|alter|truncate|create|grant|revoke)\b")
        .expect("write keyword pattern is valid")
});

/// Classifies SQL text as a single read-only statement.
pub struct ReadOnlyQueryGuard;

impl ReadOnlyQueryGuard {
    /// Check `query`, returning the first violation found.
    ///
    /// Checks run in order: blank, more than one statement, not starting with
    /// `SELECT`/`WITH`, write keyword present. One trailing `;` is tolerated.
    pub fn validate(query: &str) -> Option<ValidationError> {
        Self::normalize(query).err()
    }

    /// Same check as [`validate`](Self::validate), as a hard failure.
    pub fn require_read_only(query: &str) -> Result<(), ValidationError> {
        Self::normalize(query).map(|_| ())
    }

    /// Validate a variable's options query and return it without its
    /// trailing semicolon, ready to be rendered and executed.
    pub fn normalize_options_query(
        variable_key: &str,
        options_query: Option<&str>,
    ) -> Result<String, ValidationError> {
        let query = options_query.map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(ValidationError::missing_options_query(variable_key));
        }
        Self::normalize(query).map(str::to_string)
    }

    fn normalize(query: &str) -> Result<&str, ValidationError> {
        let trimmed = query.trim();
        let query = trimmed.strip_suffix(';').unwrap_or(trimmed).trim();

        if query.is_empty() {
            return Err(ValidationError::empty_sql());
        }
        if query.contains(';') {
            return Err(ValidationError::multiple_statements());
        }
        if !starts_with_ignore_case(query, "select") && !starts_with_ignore_case(query, "with") {
            return Err(ValidationError::not_a_query());
        }
        if WRITE_KEYWORDS.is_match(query) {
            return Err(ValidationError::not_read_only());
        }
        Ok(query)
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
