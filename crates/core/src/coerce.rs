//! Integer coercion for identifier and time inputs.
//!
//! Every id and timestamp that reaches the persistence layer passes through
//! here first, so malformed values are rejected before any SQL is built.

use serde_json::Value;

use crate::error::CoreError;

/// Parse a decimal string into an `i64`, surrounding whitespace allowed.
pub fn parse_i64(field: &str, raw: &str) -> Result<i64, CoreError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CoreError::invalid(field, format!("expected an integer, got '{raw}'")))
}

/// Coerce a JSON value into an `i64`.
///
/// Accepts JSON integers and strings holding a decimal integer. Floats are
/// accepted only when they carry no fractional part and fit in `i64`
/// (`i64::MAX as f64` is 2^63, hence the strict upper bound).
pub fn value_to_i64(field: &str, value: &Value) -> Result<i64, CoreError> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                return Ok(v);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(CoreError::invalid(field, format!("expected an integer, got {n}"))),
            }
        }
        Value::String(s) => parse_i64(field, s),
        other => Err(CoreError::invalid(
            field,
            format!("expected an integer, got {}", json_kind(other)),
        )),
    }
}

/// Short name of a JSON value's type, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn integers_and_numeric_strings_coerce() {
        assert_eq!(value_to_i64("x", &json!(42)).unwrap(), 42);
        assert_eq!(value_to_i64("x", &json!("17")).unwrap(), 17);
        assert_eq!(value_to_i64("x", &json!(" -3 ")).unwrap(), -3);
        assert_eq!(value_to_i64("x", &json!(10.0)).unwrap(), 10);
    }

    #[test]
    fn non_integers_are_rejected() {
        for bad in [json!(1.5), json!("abc"), json!(true), json!(null), json!([1])] {
            assert_matches!(
                value_to_i64("applicationId", &bad),
                Err(CoreError::InvalidArgument { ref field, .. }) if field == "applicationId"
            );
        }
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        for literal in ["9223372036854775808", "1e19", "-1e19"] {
            let value: Value = serde_json::from_str(literal).unwrap();
            assert_matches!(
                value_to_i64("applicationId", &value),
                Err(CoreError::InvalidArgument { .. }),
                "{literal}"
            );
        }
        assert_matches!(
            parse_i64("start", "9223372036854775808"),
            Err(CoreError::InvalidArgument { .. })
        );
        let max: Value = serde_json::from_str("9223372036854775807").unwrap();
        assert_eq!(value_to_i64("x", &max).unwrap(), i64::MAX);
    }

    #[test]
    fn sql_fragments_do_not_parse() {
        assert_matches!(
            parse_i64("start", "1 OR 1=1"),
            Err(CoreError::InvalidArgument { .. })
        );
    }
}
