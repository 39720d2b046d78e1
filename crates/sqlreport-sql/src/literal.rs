//! Typed SQL literal encoding.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use sqlreport_core::{ValidationError, VariableDefinition, VariableType};
use std::str::FromStr;
use std::sync::LazyLock;

/// Plain decimal with optional exponent. No underscores, no `inf`/`nan`.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE]([+-]?[0-9]+))?$")
        .expect("number pattern is valid")
});

/// Bounds on number input. Plain rendering expands the exponent into
/// digits, so both the text and the exponent are capped.
const MAX_NUMBER_CHARS: usize = 400;
const MAX_NUMBER_EXPONENT: u64 = 400;

const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const LOCAL_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];

const TRUE_ALIASES: &[&str] = &["true", "1", "yes", "y", "sim", "s"];
const FALSE_ALIASES: &[&str] = &["false", "0", "no", "n", "nao", "não"];

/// Encode a resolved value for `variable` as SQL text.
///
/// Single-value variables render `NULL` for null. Multi-value variables
/// render a parenthesized list, `(NULL)` for null; a lone scalar is treated
/// as a one-element list.
pub fn to_sql_literal(variable: &VariableDefinition, value: &Value) -> Result<String, ValidationError> {
    let key = variable.key.as_str();

    if !variable.multiple {
        return match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Array(_) => Err(ValidationError::list_not_allowed(key)),
            scalar => encode_scalar(key, variable.var_type, scalar),
        };
    }

    let items: &[Value] = match value {
        Value::Null => return Ok("(NULL)".to_string()),
        Value::Array(items) => items,
        scalar => std::slice::from_ref(scalar),
    };
    if items.is_empty() {
        return Err(ValidationError::empty_list(key));
    }

    let literals = items
        .iter()
        .map(|item| match item {
            Value::Null => Err(ValidationError::null_list_element(key)),
            item => encode_scalar(key, variable.var_type, item),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!("({})", literals.join(", ")))
}

fn encode_scalar(key: &str, var_type: VariableType, value: &Value) -> Result<String, ValidationError> {
    match var_type {
        VariableType::String => {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(ValidationError::invalid_value(key, "string")),
            };
            Ok(quote(&text))
        }
        VariableType::Number => parse_number(key, value),
        VariableType::Date => parse_date(key, value).map(|d| quote(&d)),
        VariableType::Datetime => parse_datetime(key, value).map(|d| quote(&d)),
        VariableType::Boolean => parse_boolean(key, value).map(|b| b.to_string()),
    }
}

/// Wrap in single quotes, doubling embedded quotes.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn parse_number(key: &str, value: &Value) -> Result<String, ValidationError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(ValidationError::invalid_value(key, "number")),
    };
    let invalid = || ValidationError::invalid_value(key, "number");

    if text.len() > MAX_NUMBER_CHARS {
        return Err(invalid());
    }
    let caps = NUMBER.captures(&text).ok_or_else(invalid)?;
    if let Some(exponent) = caps.get(1) {
        let exponent: i64 = exponent.as_str().parse().map_err(|_| invalid())?;
        if exponent.unsigned_abs() > MAX_NUMBER_EXPONENT {
            return Err(invalid());
        }
    }

    BigDecimal::from_str(&text)
        .map(|n| n.to_plain_string())
        .map_err(|_| invalid())
}

fn parse_date(key: &str, value: &Value) -> Result<String, ValidationError> {
    let invalid = || ValidationError::invalid_value(key, "date (yyyy-MM-dd)");
    let Value::String(text) = value else {
        return Err(invalid());
    };
    let text = text.trim();
    if !is_calendar_date_shape(text) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| invalid())
}

fn is_calendar_date_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

fn parse_datetime(key: &str, value: &Value) -> Result<String, ValidationError> {
    let invalid = || ValidationError::invalid_value(key, "datetime (ISO-8601)");
    let Value::String(text) = value else {
        return Err(invalid());
    };
    let text = text.trim();
    let text = strip_zone_id(text).unwrap_or(text);

    normalize_iso_datetime(text)
        .as_deref()
        .and_then(parse_local_or_offset)
        .map(|dt| dt.format(SQL_DATETIME_FORMAT).to_string())
        .ok_or_else(invalid)
}

/// Require a `T` (either case) between date and time, and spell a `Z`
/// offset as `+00:00` so the minute-precision formats accept it.
fn normalize_iso_datetime(text: &str) -> Option<String> {
    if !text.as_bytes().get(10)?.eq_ignore_ascii_case(&b'T') {
        return None;
    }
    let mut normalized = format!("{}T{}", &text[..10], &text[11..]);
    if normalized.ends_with(['Z', 'z']) {
        normalized.pop();
        normalized.push_str("+00:00");
    }
    Some(normalized)
}

/// Wall-clock time of a local or offset timestamp. The offset only anchors
/// parsing and is discarded.
fn parse_local_or_offset(text: &str) -> Option<NaiveDateTime> {
    LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            OFFSET_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.naive_local())
        })
}

/// `2026-02-17T10:00:00-04:00[America/Porto_Velho]` -> `2026-02-17T10:00:00-04:00`
fn strip_zone_id(text: &str) -> Option<&str> {
    let without = text.strip_suffix(']')?;
    let open = without.rfind('[')?;
    Some(&without[..open])
}

fn parse_boolean(key: &str, value: &Value) -> Result<bool, ValidationError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => {
            let normalized = s.trim().to_lowercase();
            if TRUE_ALIASES.contains(&normalized.as_str()) {
                Ok(true)
            } else if FALSE_ALIASES.contains(&normalized.as_str()) {
                Ok(false)
            } else {
                Err(ValidationError::invalid_value(key, "boolean"))
            }
        }
        _ => Err(ValidationError::invalid_value(key, "boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlreport_core::ValidationErrorKind;

    fn single(ty: VariableType, value: Value) -> Result<String, ValidationError> {
        to_sql_literal(&VariableDefinition::new("v", ty), &value)
    }

    fn multi(ty: VariableType, value: Value) -> Result<String, ValidationError> {
        to_sql_literal(&VariableDefinition::new("v", ty).multiple(), &value)
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(single(VariableType::String, json!("O'Reilly")).unwrap(), "'O''Reilly'");
        assert_eq!(single(VariableType::String, json!("''")).unwrap(), "''''''");
        assert_eq!(single(VariableType::String, json!(42)).unwrap(), "'42'");
    }

    #[test]
    fn test_number_is_plain_decimal() {
        assert_eq!(single(VariableType::Number, json!("10.50")).unwrap(), "10.50");
        assert_eq!(single(VariableType::Number, json!(" -3 ")).unwrap(), "-3");
        assert_eq!(single(VariableType::Number, json!(7)).unwrap(), "7");
        assert_eq!(single(VariableType::Number, json!(2.5)).unwrap(), "2.5");
        assert_eq!(single(VariableType::Number, json!("1E+3")).unwrap(), "1000");
    }

    #[test]
    fn test_number_rejects_non_numeric() {
        let err = single(VariableType::Number, json!("1; DROP TABLE t")).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidValue);
        assert_eq!(err.message, "Parameter 'v' must be number");
        assert!(single(VariableType::Number, json!(true)).is_err());
        assert!(single(VariableType::Number, json!("1_000")).is_err());
        assert!(single(VariableType::Number, json!("NaN")).is_err());
    }

    #[test]
    fn test_number_rejects_oversized_exponent() {
        for text in [
            "1e9223372036854775807",
            "1e-9223372036854775808",
            "1e99999999999999999999",
            "1e1000000000",
            "1e100000",
            "1e-100000",
        ] {
            let err = single(VariableType::Number, json!(text)).unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::InvalidValue, "{text}");
        }
        assert!(single(VariableType::Number, json!("9".repeat(1000))).is_err());

        assert_eq!(single(VariableType::Number, json!("1e6")).unwrap(), "1000000");
        assert_eq!(single(VariableType::Number, json!("25e-2")).unwrap(), "0.25");
    }

    #[test]
    fn test_date() {
        assert_eq!(single(VariableType::Date, json!("2026-02-17")).unwrap(), "'2026-02-17'");
        assert!(single(VariableType::Date, json!("17/02/2026")).is_err());
        assert!(single(VariableType::Date, json!("2026-2-17")).is_err());
        assert!(single(VariableType::Date, json!("2026-02-30")).is_err());
        assert!(single(VariableType::Date, json!(20260217)).is_err());
    }

    #[test]
    fn test_datetime_variants() {
        assert_eq!(
            single(VariableType::Datetime, json!("2026-02-17T08:30:15")).unwrap(),
            "'2026-02-17 08:30:15'"
        );
        assert_eq!(
            single(VariableType::Datetime, json!("2026-02-17T08:30")).unwrap(),
            "'2026-02-17 08:30:00'"
        );
        assert_eq!(
            single(VariableType::Datetime, json!("2026-02-17T08:30:15.250")).unwrap(),
            "'2026-02-17 08:30:15'"
        );
        assert_eq!(
            single(VariableType::Datetime, json!("2026-02-17T08:30:15-04:00")).unwrap(),
            "'2026-02-17 08:30:15'"
        );
        assert_eq!(
            single(VariableType::Datetime, json!("2026-02-17T08:30:15Z")).unwrap(),
            "'2026-02-17 08:30:15'"
        );
        assert_eq!(
            single(
                VariableType::Datetime,
                json!("2026-02-17T08:30:15-04:00[America/Porto_Velho]")
            )
            .unwrap(),
            "'2026-02-17 08:30:15'"
        );
        assert!(single(VariableType::Datetime, json!("2026-02-17")).is_err());
        assert!(single(VariableType::Datetime, json!("yesterday")).is_err());
    }

    #[test]
    fn test_datetime_utc_designator_and_separator_case() {
        for text in [
            "2026-02-17T08:30Z",
            "2026-02-17T08:30Z[UTC]",
            "2026-02-17t08:30:00",
            "2026-02-17t08:30:00z",
        ] {
            assert_eq!(
                single(VariableType::Datetime, json!(text)).unwrap(),
                "'2026-02-17 08:30:00'",
                "{text}"
            );
        }
    }

    #[test]
    fn test_datetime_rejects_space_separator() {
        for text in ["2026-02-17 08:30:15+00:00", "2026-02-17 08:30:15", "2026-02-17 08:30Z"] {
            let err = single(VariableType::Datetime, json!(text)).unwrap_err();
            assert_eq!(err.kind, ValidationErrorKind::InvalidValue, "{text}");
        }
    }

    #[test]
    fn test_boolean_aliases() {
        for alias in ["true", "1", "YES", "y", "Sim", "s"] {
            assert_eq!(single(VariableType::Boolean, json!(alias)).unwrap(), "true");
        }
        for alias in ["false", "0", "No", "n", "nao", "NÃO"] {
            assert_eq!(single(VariableType::Boolean, json!(alias)).unwrap(), "false");
        }
        assert_eq!(single(VariableType::Boolean, json!(true)).unwrap(), "true");
        assert!(single(VariableType::Boolean, json!("maybe")).is_err());
        assert!(single(VariableType::Boolean, json!(1)).is_err());
    }

    #[test]
    fn test_null_rendering() {
        assert_eq!(single(VariableType::String, Value::Null).unwrap(), "NULL");
        assert_eq!(multi(VariableType::String, Value::Null).unwrap(), "(NULL)");
    }

    #[test]
    fn test_multiple_values() {
        assert_eq!(
            multi(VariableType::Number, json!([1, "2.50", 3])).unwrap(),
            "(1, 2.50, 3)"
        );
        assert_eq!(multi(VariableType::String, json!("solo")).unwrap(), "('solo')");
    }

    #[test]
    fn test_multiple_rejects_empty_and_null_items() {
        let err = multi(VariableType::Number, json!([])).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::EmptyList);
        assert!(err.message.contains("cannot be an empty list"));

        let err = multi(VariableType::String, json!(["a", null])).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::NullListElement);
    }

    #[test]
    fn test_single_rejects_list() {
        let err = single(VariableType::String, json!(["a"])).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidValue);
    }
}
