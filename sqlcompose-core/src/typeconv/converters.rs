//! Reusable converter functions shared by the dialect presets

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Error, Result, SemanticType, Value};

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

fn expected(value: &Value, source: &str, target: SemanticType) -> Error {
    Error::conversion(
        value.type_name(),
        target.to_string(),
        format!("expected {}", source),
    )
}

/// Parse a timestamp from the textual forms backends commonly emit
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }

    // RFC 3339 with an explicit offset, normalized to UTC
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_utc())
        .map_err(|e| {
            Error::conversion(
                "TEXT",
                "TIMESTAMP",
                format!("cannot parse time string {:?}: {}", text, e),
            )
        })
}

/// TEXT -> TIMESTAMP
pub fn string_to_timestamp(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => parse_timestamp(s).map(Value::Timestamp),
        other => Err(expected(other, "TEXT", SemanticType::Timestamp)),
    }
}

/// BIGINT unix seconds -> TIMESTAMP
pub fn int64_to_timestamp(value: &Value) -> Result<Value> {
    let secs = match value {
        Value::I64(i) => *i,
        Value::I32(i) => *i as i64,
        other => return Err(expected(other, "BIGINT", SemanticType::Timestamp)),
    };
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| Value::Timestamp(dt.naive_utc()))
        .ok_or_else(|| Error::conversion("BIGINT", "TIMESTAMP", format!("{} out of range", secs)))
}

/// BYTEA holding text -> TIMESTAMP
pub fn bytes_to_timestamp(value: &Value) -> Result<Value> {
    match value {
        Value::Bytes(b) => parse_timestamp(&String::from_utf8_lossy(b)).map(Value::Timestamp),
        other => Err(expected(other, "BYTEA", SemanticType::Timestamp)),
    }
}

/// Accepts a native timestamp, a formatted string, raw text bytes or unix seconds
pub fn default_timestamp(value: &Value) -> Result<Value> {
    match value {
        Value::Timestamp(_) => Ok(value.clone()),
        Value::String(_) => string_to_timestamp(value),
        Value::I64(_) | Value::I32(_) => int64_to_timestamp(value),
        Value::Bytes(_) => bytes_to_timestamp(value),
        other => Err(Error::conversion(
            other.type_name(),
            "TIMESTAMP",
            "unsupported source representation",
        )),
    }
}

/// Same as [`default_timestamp`] but NULL stays NULL
pub fn default_nullable_timestamp(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        other => default_timestamp(other),
    }
}

/// Integer 0/1 -> BOOLEAN
pub fn int64_to_bool(value: &Value) -> Result<Value> {
    match value {
        Value::I64(i) => Ok(Value::Bool(*i != 0)),
        Value::I32(i) => Ok(Value::Bool(*i != 0)),
        other => Err(expected(other, "BIGINT", SemanticType::Bool)),
    }
}

fn parse_bool(text: &str) -> Result<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(Error::conversion(
            "TEXT",
            "BOOLEAN",
            format!("invalid syntax {:?}", other),
        )),
    }
}

/// TEXT -> BOOLEAN
pub fn string_to_bool(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => parse_bool(s).map(Value::Bool),
        other => Err(expected(other, "TEXT", SemanticType::Bool)),
    }
}

/// Accepts a native boolean, an integer flag, or its textual forms
pub fn default_bool(value: &Value) -> Result<Value> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::I64(_) | Value::I32(_) => int64_to_bool(value),
        Value::String(_) => string_to_bool(value),
        Value::Bytes(b) => parse_bool(&String::from_utf8_lossy(b)).map(Value::Bool),
        other => Err(Error::conversion(
            other.type_name(),
            "BOOLEAN",
            "unsupported source representation",
        )),
    }
}

/// BYTEA holding UTF-8 -> TEXT
pub fn bytes_to_string(value: &Value) -> Result<Value> {
    match value {
        Value::Bytes(b) => String::from_utf8(b.clone())
            .map(Value::String)
            .map_err(|e| Error::conversion("BYTEA", "TEXT", e.to_string())),
        other => Err(expected(other, "BYTEA", SemanticType::Text)),
    }
}

/// TEXT -> JSON
pub fn string_to_json(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::Json(serde_json::from_str(s)?)),
        other => Err(expected(other, "TEXT", SemanticType::Json)),
    }
}

/// TEXT or 16 raw bytes -> UUID
#[cfg(feature = "uuid-support")]
pub fn to_uuid(value: &Value) -> Result<Value> {
    let parsed = match value {
        Value::Uuid(_) => return Ok(value.clone()),
        Value::String(s) => uuid::Uuid::parse_str(s),
        Value::Bytes(b) => uuid::Uuid::from_slice(b),
        other => return Err(expected(other, "TEXT or BYTEA", SemanticType::Uuid)),
    };
    parsed
        .map(Value::Uuid)
        .map_err(|e| Error::conversion(value.type_name(), "UUID", e.to_string()))
}

/// TEXT, float or integer -> DECIMAL
#[cfg(feature = "decimal-support")]
pub fn to_decimal(value: &Value) -> Result<Value> {
    use rust_decimal::prelude::FromPrimitive;
    use std::str::FromStr;

    let parsed = match value {
        Value::Decimal(_) => return Ok(value.clone()),
        Value::String(s) => rust_decimal::Decimal::from_str(s)
            .map_err(|e| Error::conversion("TEXT", "DECIMAL", e.to_string()))?,
        Value::F64(f) => rust_decimal::Decimal::from_f64(*f)
            .ok_or_else(|| Error::conversion("DOUBLE PRECISION", "DECIMAL", "not representable"))?,
        Value::I64(i) => rust_decimal::Decimal::from(*i),
        Value::I32(i) => rust_decimal::Decimal::from(*i),
        other => return Err(expected(other, "TEXT or number", SemanticType::Decimal)),
    };
    Ok(Value::Decimal(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_string_to_timestamp_formats() {
        for text in [
            "2024-01-15 10:30:00",
            "2024-01-15 10:30:00.123456",
            "2024-01-15T10:30:00Z",
            "2024-01-15T10:30:00+00:00",
        ] {
            let value = string_to_timestamp(&Value::from(text)).unwrap();
            match value {
                Value::Timestamp(ts) => {
                    assert_eq!(ts.year(), 2024);
                    assert_eq!(ts.hour(), 10);
                }
                other => panic!("unexpected value {:?}", other),
            }
        }
    }

    #[test]
    fn test_rfc3339_offset_is_normalized() {
        let ts = parse_timestamp("2024-01-15T12:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_invalid_timestamp_string() {
        let err = string_to_timestamp(&Value::from("yesterday")).unwrap_err();
        assert!(matches!(err, Error::ConversionError { .. }));
    }

    #[test]
    fn test_int64_to_timestamp() {
        let value = int64_to_timestamp(&Value::I64(1705318200)).unwrap();
        assert!(matches!(value, Value::Timestamp(ts) if ts.year() == 2024));
    }

    #[test]
    fn test_default_timestamp_rejects_bool() {
        assert!(default_timestamp(&Value::Bool(true)).is_err());
        assert_eq!(default_nullable_timestamp(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_bool_converters() {
        assert_eq!(int64_to_bool(&Value::I64(0)).unwrap(), Value::Bool(false));
        assert_eq!(string_to_bool(&Value::from("t")).unwrap(), Value::Bool(true));
        assert_eq!(default_bool(&Value::Bytes(b"1".to_vec())).unwrap(), Value::Bool(true));
        assert!(string_to_bool(&Value::from("maybe")).is_err());
    }

    #[test]
    fn test_bytes_to_string() {
        assert_eq!(
            bytes_to_string(&Value::Bytes(b"abc".to_vec())).unwrap(),
            Value::from("abc")
        );
    }

    #[test]
    fn test_string_to_json() {
        let value = string_to_json(&Value::from(r#"{"a": 1}"#)).unwrap();
        assert_eq!(value, Value::Json(serde_json::json!({"a": 1})));
    }
}
