//! Validation error types.
//!
//! A `ValidationError` is always safe to show to the requester verbatim: it
//! names parameters, variables and placeholders supplied by that requester and
//! never anything about ACL entries or upstream internals.

use std::fmt;

/// Error type for validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The kind of validation error.
    pub kind: ValidationErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    // =========================================================================
    // PARAMETER ERRORS
    // =========================================================================

    /// Parameters that do not correspond to any variable. Keys are sorted.
    pub fn unknown_parameters<S: AsRef<str>>(keys: &[S]) -> Self {
        let mut keys: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        keys.sort_unstable();
        Self::new(
            ValidationErrorKind::UnknownParameters,
            format!("Unknown parameters: {}", keys.join(", ")),
        )
    }

    /// A required variable has no value and no default.
    pub fn missing_required(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::MissingRequired,
            format!("Missing required parameter: '{}'", key),
        )
    }

    /// A value could not be encoded as the variable's type.
    pub fn invalid_value(key: &str, expected: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidValue,
            format!("Parameter '{}' must be {}", key, expected),
        )
    }

    /// A multi-value variable received an empty list.
    pub fn empty_list(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::EmptyList,
            format!("Parameter '{}' cannot be an empty list", key),
        )
    }

    /// A multi-value variable received a list containing null.
    pub fn null_list_element(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::NullListElement,
            format!("Parameter '{}' cannot contain null values", key),
        )
    }

    /// A single-value variable received a list.
    pub fn list_not_allowed(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidValue,
            format!("Parameter '{}' does not accept multiple values", key),
        )
    }

    // =========================================================================
    // VARIABLE DEFINITION ERRORS
    // =========================================================================

    /// Variable type outside the closed set.
    pub fn invalid_variable_type(ty: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidVariableType,
            format!(
                "Invalid variable type: '{}'. Use string, number, date, datetime or boolean",
                ty
            ),
        )
    }

    /// Variable key is not an identifier.
    pub fn invalid_variable_key(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidVariableKey,
            format!(
                "Invalid variable key: '{}'. Keys must match [A-Za-z_][A-Za-z0-9_]*",
                key
            ),
        )
    }

    /// Two variables share a key (case-insensitive).
    pub fn duplicate_variable(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::DuplicateVariable,
            format!("Duplicate variable: '{}'", key),
        )
    }

    /// No variable with this key exists on the report.
    pub fn unknown_variable(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::UnknownVariable,
            format!("Variable '{}' not found", key),
        )
    }

    // =========================================================================
    // READ-ONLY SQL ERRORS
    // =========================================================================

    pub fn empty_sql() -> Self {
        Self::new(ValidationErrorKind::EmptySql, "SQL cannot be empty")
    }

    pub fn multiple_statements() -> Self {
        Self::new(
            ValidationErrorKind::MultipleStatements,
            "SQL must contain exactly one statement",
        )
    }

    pub fn not_a_query() -> Self {
        Self::new(
            ValidationErrorKind::NotAQuery,
            "SQL must start with SELECT or WITH",
        )
    }

    pub fn not_read_only() -> Self {
        Self::new(ValidationErrorKind::NotReadOnly, "SQL must be read-only")
    }

    // =========================================================================
    // TEMPLATE CONSISTENCY ERRORS
    // =========================================================================

    /// Placeholders in the template with no matching variable. Names are sorted.
    pub fn unknown_placeholders<S: AsRef<str>>(names: &[S]) -> Self {
        let mut names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        names.sort_unstable();
        Self::new(
            ValidationErrorKind::UnknownPlaceholders,
            format!(
                "Placeholders without a configured variable: {}",
                names.join(", ")
            ),
        )
    }

    /// A multi-value variable written as `IN (:key)`.
    pub fn parenthesized_in(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidInSyntax,
            format!(
                "Multi-value variable '{}' must use `IN :{}` (without parentheses)",
                key, key
            ),
        )
    }

    /// A multi-value variable referenced outside an `IN` clause.
    pub fn missing_in(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidInSyntax,
            format!("Multi-value variable '{}' must be used with `IN :{}`", key, key),
        )
    }

    // =========================================================================
    // VARIABLE OPTIONS ERRORS
    // =========================================================================

    pub fn missing_options_query(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::OptionsQuery,
            format!("Variable '{}' has no options query configured", key),
        )
    }

    pub fn option_columns(value_column: &str, label_column: &str) -> Self {
        Self::new(
            ValidationErrorKind::OptionsQuery,
            format!(
                "Options query must return exactly 2 columns: '{}' and '{}'",
                value_column, label_column
            ),
        )
    }

    pub fn malformed_option_row(row: usize) -> Self {
        Self::new(
            ValidationErrorKind::OptionsQuery,
            format!("Row {} of the options query is not an object", row),
        )
    }

    // =========================================================================
    // ACL SUBJECT ERRORS
    // =========================================================================

    pub fn invalid_subject_type(subject_type: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidSubject,
            format!(
                "Invalid ACL subject type: '{}'. Use USER or ROLE",
                subject_type
            ),
        )
    }

    pub fn invalid_subject_key(subject_type: &str, key: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidSubject,
            format!("Invalid ACL subject key for {}: '{}'", subject_type, key),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    // =========================================================================
    // Parameter errors
    // =========================================================================
    /// A parameter key matches no variable.
    UnknownParameters,
    /// A required variable could not be resolved.
    MissingRequired,
    /// A value does not fit the variable type.
    InvalidValue,
    /// A multi-value variable received `[]`.
    EmptyList,
    /// A multi-value list contained null.
    NullListElement,

    // =========================================================================
    // Variable definition errors
    // =========================================================================
    InvalidVariableType,
    InvalidVariableKey,
    DuplicateVariable,
    UnknownVariable,

    // =========================================================================
    // Read-only SQL errors
    // =========================================================================
    EmptySql,
    MultipleStatements,
    NotAQuery,
    NotReadOnly,

    // =========================================================================
    // Template consistency errors
    // =========================================================================
    UnknownPlaceholders,
    InvalidInSyntax,

    // =========================================================================
    // Other
    // =========================================================================
    /// Options query missing or returning the wrong shape.
    OptionsQuery,
    /// ACL subject could not be decoded.
    InvalidSubject,
}
