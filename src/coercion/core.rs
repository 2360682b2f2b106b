use crate::error::{ErrorCode, TransactionError};
use crate::spec::{ParameterSchema, SchemaType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options governing string → value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoercionOptions {
    /// Reject numbers whose canonical rendering differs from the input
    pub strictly_reentrant: bool,
}

impl Default for CoercionOptions {
    fn default() -> Self {
        Self {
            strictly_reentrant: true,
        }
    }
}

/// Canonical rendering of a parsed number (shortest round-trip, never exponential).
#[must_use]
pub fn restringify_number(value: f64) -> String {
    value.to_string()
}

pub fn parse_number(options: &CoercionOptions, s: &str) -> Result<f64, TransactionError> {
    let value = s
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TransactionError::new(ErrorCode::BadNumber, [s]))?;

    if options.strictly_reentrant {
        let restringified = restringify_number(value);
        if restringified != s {
            return Err(TransactionError::new(
                ErrorCode::NonReentrantNumber,
                [s.to_string(), restringified],
            ));
        }
    }

    Ok(value)
}

pub fn parse_boolean(s: &str) -> Result<bool, TransactionError> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(TransactionError::new(ErrorCode::BadBoolean, [s])),
    }
}

#[must_use]
pub fn parse_array_of_strings(s: &str) -> Vec<String> {
    s.split(',').map(str::to_string).collect()
}

pub fn parse_array_of_numbers(
    options: &CoercionOptions,
    s: &str,
) -> Result<Vec<f64>, TransactionError> {
    s.split(',').map(|item| parse_number(options, item)).collect()
}

pub fn parse_array_of_booleans(s: &str) -> Result<Vec<bool>, TransactionError> {
    s.split(',').map(parse_boolean).collect()
}

fn parse_integer(options: &CoercionOptions, s: &str) -> Result<Value, TransactionError> {
    let value = parse_number(options, s)?;
    // Anything past 2^53 is no longer exact in an f64.
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() != 0.0 || value.abs() > MAX_EXACT {
        return Err(TransactionError::new(ErrorCode::BadInteger, [s]));
    }
    Ok(Value::from(value as i64))
}

fn coerce_scalar(
    options: &CoercionOptions,
    schema_type: SchemaType,
    s: &str,
) -> Result<Value, TransactionError> {
    match schema_type {
        SchemaType::Number => parse_number(options, s).map(Value::from),
        SchemaType::Integer => parse_integer(options, s),
        SchemaType::Boolean => parse_boolean(s).map(Value::Bool),
        SchemaType::String | SchemaType::Array | SchemaType::Object => {
            Ok(Value::String(s.to_string()))
        }
    }
}

/// Coerce a raw path/query/header/cookie value according to its declared schema.
///
/// Arrays are comma separated and their items coerced with `items.type`
/// (strings when absent). Objects are not coerced and pass through as strings.
pub fn coerce_value(
    options: &CoercionOptions,
    schema: &ParameterSchema,
    s: &str,
) -> Result<Value, TransactionError> {
    match schema.schema_type {
        SchemaType::Array => {
            let item_type = schema
                .items
                .as_ref()
                .map(|items| items.schema_type)
                .unwrap_or_default();
            let values = match item_type {
                SchemaType::Number => parse_array_of_numbers(options, s)?
                    .into_iter()
                    .map(Value::from)
                    .collect(),
                SchemaType::Boolean => parse_array_of_booleans(s)?
                    .into_iter()
                    .map(Value::Bool)
                    .collect(),
                SchemaType::String => parse_array_of_strings(s)
                    .into_iter()
                    .map(Value::String)
                    .collect(),
                other => s
                    .split(',')
                    .map(|item| coerce_scalar(options, other, item))
                    .collect::<Result<Vec<_>, _>>()?,
            };
            Ok(Value::Array(values))
        }
        scalar => coerce_scalar(options, scalar, s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT: CoercionOptions = CoercionOptions {
        strictly_reentrant: true,
    };
    const LOOSE: CoercionOptions = CoercionOptions {
        strictly_reentrant: false,
    };

    #[test]
    fn test_parse_number_canonical() {
        for s in ["0", "7", "-7", "42", "3.14", "-0.5", "1000000", "0.001"] {
            let n = parse_number(&STRICT, s).unwrap();
            assert_eq!(restringify_number(n), s);
        }
    }

    #[test]
    fn test_parse_number_non_reentrant() {
        for (input, canonical) in [("007", "7"), ("1e1", "10"), ("1.0", "1"), ("+1", "1"), (".5", "0.5")] {
            let err = parse_number(&STRICT, input).unwrap_err();
            assert_eq!(err.code(), ErrorCode::NonReentrantNumber);
            assert_eq!(err.params(), [input.to_string(), canonical.to_string()]);
        }
    }

    #[test]
    fn test_parse_number_loose_accepts_non_canonical() {
        assert_eq!(parse_number(&LOOSE, "007").unwrap(), 7.0);
        assert_eq!(parse_number(&LOOSE, "1e1").unwrap(), 10.0);
    }

    #[test]
    fn test_parse_number_rejects_garbage_and_non_finite() {
        for s in ["", "abc", "NaN", "inf", "1,2"] {
            let err = parse_number(&LOOSE, s).unwrap_err();
            assert_eq!(err.code(), ErrorCode::BadNumber, "input {s:?}");
        }
    }

    #[test]
    fn test_parse_boolean_strict() {
        assert!(parse_boolean("true").unwrap());
        assert!(!parse_boolean("false").unwrap());
        for s in ["1", "", "TRUE", "False", "yes"] {
            assert_eq!(parse_boolean(s).unwrap_err().code(), ErrorCode::BadBoolean);
        }
    }

    #[test]
    fn test_arrays() {
        assert_eq!(parse_array_of_strings("a,b,,c"), ["a", "b", "", "c"]);
        assert_eq!(parse_array_of_numbers(&STRICT, "1,2.5,-3").unwrap(), [1.0, 2.5, -3.0]);
        assert_eq!(
            parse_array_of_numbers(&STRICT, "1,02").unwrap_err().code(),
            ErrorCode::NonReentrantNumber
        );
        assert_eq!(parse_array_of_booleans("true,false").unwrap(), [true, false]);
        assert_eq!(
            parse_array_of_booleans("true,no").unwrap_err().code(),
            ErrorCode::BadBoolean
        );
    }

    #[test]
    fn test_coerce_value_by_schema() {
        use serde_json::json;
        assert_eq!(
            coerce_value(&STRICT, &ParameterSchema::of(SchemaType::Integer), "42").unwrap(),
            json!(42)
        );
        assert_eq!(
            coerce_value(&STRICT, &ParameterSchema::of(SchemaType::Integer), "4.2")
                .unwrap_err()
                .code(),
            ErrorCode::BadInteger
        );
        assert_eq!(
            coerce_value(&STRICT, &ParameterSchema::of(SchemaType::String), "007").unwrap(),
            json!("007")
        );
        assert_eq!(
            coerce_value(&STRICT, &ParameterSchema::array_of(SchemaType::Number), "1,2").unwrap(),
            json!([1.0, 2.0])
        );
        assert_eq!(
            coerce_value(&STRICT, &ParameterSchema::array_of(SchemaType::Integer), "1,2").unwrap(),
            json!([1, 2])
        );
        assert_eq!(
            coerce_value(
                &STRICT,
                &ParameterSchema {
                    schema_type: SchemaType::Array,
                    items: None
                },
                "a,b"
            )
            .unwrap(),
            json!(["a", "b"])
        );
    }
}
