//! `:name` placeholder scanning.
//!
//! A placeholder is a colon followed by an identifier. The identifier is
//! matched greedily, so `:status` never matches inside `:status2`, and a colon
//! preceded by another colon (a `::type` cast) is not a placeholder.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid")
});

/// One placeholder occurrence. `start..end` covers the colon and the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub name: &'a str,
    pub start: usize,
    pub end: usize,
}

/// All placeholder occurrences in `template`, in order.
pub fn scan_placeholders(template: &str) -> Vec<Placeholder<'_>> {
    let bytes = template.as_bytes();
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            if whole.start() > 0 && bytes[whole.start() - 1] == b':' {
                return None;
            }
            Some(Placeholder {
                name: name.as_str(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Distinct placeholder names in `template`.
pub fn extract_placeholders(template: &str) -> BTreeSet<String> {
    scan_placeholders(template)
        .into_iter()
        .map(|p| p.name.to_string())
        .collect()
}
