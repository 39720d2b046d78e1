//! Template/variable consistency checks.
//!
//! These run when a template is saved or validated, without real parameter
//! values:
//! - every placeholder must have a variable
//! - every multi-value variable used in the template must appear as `IN :key`
//!
//! `IN (:key)` is rejected because the renderer already supplies the
//! parentheses for multi-value variables.

use crate::placeholder::{Placeholder, scan_placeholders};
use sqlreport_core::{ValidationError, VariableDefinition};
use std::collections::BTreeSet;

/// All consistency problems in `template`, in a stable order.
pub fn check_consistency(
    template: &str,
    variables: &[VariableDefinition],
) -> Vec<ValidationError> {
    let occurrences = scan_placeholders(template);
    let mut errors = Vec::new();

    let unknown: BTreeSet<&str> = occurrences
        .iter()
        .map(|p| p.name)
        .filter(|name| !variables.iter().any(|v| v.key == *name))
        .collect();
    if !unknown.is_empty() {
        let unknown: Vec<&str> = unknown.into_iter().collect();
        errors.push(ValidationError::unknown_placeholders(&unknown));
    }

    for variable in variables.iter().filter(|v| v.multiple) {
        let uses: Vec<&Placeholder<'_>> = occurrences
            .iter()
            .filter(|p| p.name == variable.key)
            .collect();
        if uses.is_empty() {
            continue;
        }
        if uses.iter().any(|p| is_parenthesized_in(template, p)) {
            errors.push(ValidationError::parenthesized_in(&variable.key));
        } else if !uses.iter().any(|p| ends_with_in(&template[..p.start])) {
            errors.push(ValidationError::missing_in(&variable.key));
        }
    }

    errors
}

/// First consistency problem, if any.
pub fn require_consistent(
    template: &str,
    variables: &[VariableDefinition],
) -> Result<(), ValidationError> {
    match check_consistency(template, variables).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// `IN ( :key )`
fn is_parenthesized_in(template: &str, placeholder: &Placeholder<'_>) -> bool {
    let before = template[..placeholder.start].trim_end();
    let after = template[placeholder.end..].trim_start();
    match before.strip_suffix('(') {
        Some(head) => ends_with_in(head) && after.starts_with(')'),
        None => false,
    }
}

/// Whether `text`, ignoring trailing whitespace, ends with the word `IN`.
fn ends_with_in(text: &str) -> bool {
    let text = text.trim_end();
    let Some(split) = text.len().checked_sub(2) else {
        return false;
    };
    let Some(word) = text.get(split..) else {
        return false;
    };
    if !word.eq_ignore_ascii_case("in") {
        return false;
    }
    !text[..split]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}
