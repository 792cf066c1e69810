//! Value types for SQL parameters and scanned columns

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A SQL value that can be bound as a parameter or read back from a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// JSON value
    Json(serde_json::Value),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// UUID value
    #[cfg(feature = "uuid-support")]
    Uuid(uuid::Uuid),
    /// Arbitrary precision decimal
    #[cfg(feature = "decimal-support")]
    Decimal(rust_decimal::Decimal),
    /// List of values, expanded into one placeholder per element by `IN`
    Array(Vec<Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The semantic type of this value, `None` for NULL and lists
    pub fn semantic_type(&self) -> Option<SemanticType> {
        let ty = match self {
            Value::Null | Value::Array(_) => return None,
            Value::Bool(_) => SemanticType::Bool,
            Value::I32(_) => SemanticType::I32,
            Value::I64(_) => SemanticType::I64,
            Value::F64(_) => SemanticType::F64,
            Value::String(_) => SemanticType::Text,
            Value::Bytes(_) => SemanticType::Bytes,
            Value::Json(_) => SemanticType::Json,
            Value::Timestamp(_) => SemanticType::Timestamp,
            #[cfg(feature = "uuid-support")]
            Value::Uuid(_) => SemanticType::Uuid,
            #[cfg(feature = "decimal-support")]
            Value::Decimal(_) => SemanticType::Decimal,
        };
        Some(ty)
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Array(_) => "ARRAY".to_string(),
            other => other
                .semantic_type()
                .map(|ty| ty.to_string())
                .unwrap_or_default(),
        }
    }

    /// Build a list value for `IN` conditions
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Extract array values if this is an Array variant
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

/// The logical type of a column or value, independent of backend representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    Bool,
    I32,
    I64,
    F64,
    Text,
    Bytes,
    Json,
    Timestamp,
    Uuid,
    Decimal,
    /// A target that can hold NULL in addition to the inner type
    Nullable(Box<SemanticType>),
}

impl SemanticType {
    /// Wrap a type so that it accepts NULL
    pub fn nullable(inner: SemanticType) -> Self {
        match inner {
            already @ SemanticType::Nullable(_) => already,
            other => SemanticType::Nullable(Box::new(other)),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, SemanticType::Nullable(_))
    }

    /// The type with any nullable wrapper removed
    pub fn inner(&self) -> &SemanticType {
        match self {
            SemanticType::Nullable(inner) => inner.inner(),
            other => other,
        }
    }

    /// Whether a value of `source` can be stored in this type unchanged
    pub fn accepts(&self, source: &SemanticType) -> bool {
        if self == source {
            return true;
        }
        match self {
            SemanticType::Nullable(inner) => inner.accepts(source.inner()),
            _ => false,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Bool => write!(f, "BOOLEAN"),
            SemanticType::I32 => write!(f, "INTEGER"),
            SemanticType::I64 => write!(f, "BIGINT"),
            SemanticType::F64 => write!(f, "DOUBLE PRECISION"),
            SemanticType::Text => write!(f, "TEXT"),
            SemanticType::Bytes => write!(f, "BYTEA"),
            SemanticType::Json => write!(f, "JSON"),
            SemanticType::Timestamp => write!(f, "TIMESTAMP"),
            SemanticType::Uuid => write!(f, "UUID"),
            SemanticType::Decimal => write!(f, "DECIMAL"),
            SemanticType::Nullable(inner) => write!(f, "NULLABLE {}", inner),
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(val: NaiveDateTime) -> Self {
        Value::Timestamp(val)
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::Uuid(val)
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::Decimal(val)
    }
}

impl<T, const N: usize> From<[T; N]> for Value
where
    T: Into<Value>,
{
    fn from(vals: [T; N]) -> Self {
        Value::list(vals)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Extraction of Rust values from scanned [`Value`]s
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(value: &Value, to: &str) -> Error {
    Error::conversion(value.type_name(), to, "incompatible value")
}

fn non_null(value: &Value, to: &str) -> Result<()> {
    if value.is_null() {
        return Err(Error::NonNullableNilTarget {
            target: to.to_string(),
        });
    }
    Ok(())
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "bool")?;
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(&other, "bool")),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "i32")?;
        match value {
            Value::I32(i) => Ok(i),
            Value::I64(i) => i32::try_from(i)
                .map_err(|e| Error::conversion("BIGINT", "i32", e.to_string())),
            other => Err(mismatch(&other, "i32")),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "i64")?;
        match value {
            Value::I64(i) => Ok(i),
            Value::I32(i) => Ok(i as i64),
            other => Err(mismatch(&other, "i64")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "f64")?;
        match value {
            Value::F64(f) => Ok(f),
            Value::I32(i) => Ok(i as f64),
            Value::I64(i) => Ok(i as f64),
            other => Err(mismatch(&other, "f64")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "String")?;
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch(&other, "String")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "Vec<u8>")?;
        match value {
            Value::Bytes(b) => Ok(b),
            Value::String(s) => Ok(s.into_bytes()),
            other => Err(mismatch(&other, "Vec<u8>")),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "NaiveDateTime")?;
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(mismatch(&other, "NaiveDateTime")),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "JSON")?;
        match value {
            Value::Json(json) => Ok(json),
            Value::String(s) => Ok(serde_json::from_str(&s)?),
            other => Err(mismatch(&other, "JSON")),
        }
    }
}

#[cfg(feature = "uuid-support")]
impl FromValue for uuid::Uuid {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "Uuid")?;
        match value {
            Value::Uuid(u) => Ok(u),
            other => Err(mismatch(&other, "Uuid")),
        }
    }
}

#[cfg(feature = "decimal-support")]
impl FromValue for rust_decimal::Decimal {
    fn from_value(value: Value) -> Result<Self> {
        non_null(&value, "Decimal")?;
        match value {
            Value::Decimal(d) => Ok(d),
            other => Err(mismatch(&other, "Decimal")),
        }
    }
}

impl<T> FromValue for Option<T>
where
    T: FromValue,
{
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I32(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
    }

    #[test]
    fn test_array_conversion() {
        let value = Value::from([1, 2, 3]);
        assert_eq!(
            value,
            Value::Array(vec![Value::I32(1), Value::I32(2), Value::I32(3)])
        );
        assert_eq!(value.as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i32)), Value::I32(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_semantic_types() {
        assert_eq!(Value::I64(1).semantic_type(), Some(SemanticType::I64));
        assert_eq!(Value::from("x").semantic_type(), Some(SemanticType::Text));
        assert_eq!(Value::Null.semantic_type(), None);
        assert_eq!(Value::Null.type_name(), "NULL");
        assert_eq!(Value::I32(1).type_name(), "INTEGER");
    }

    #[test]
    fn test_nullable_accepts_inner() {
        let target = SemanticType::nullable(SemanticType::Timestamp);
        assert!(target.is_nullable());
        assert!(target.accepts(&SemanticType::Timestamp));
        assert!(!target.accepts(&SemanticType::Text));
        assert!(!SemanticType::Timestamp.accepts(&target));
        // wrapping twice is a no-op
        assert_eq!(SemanticType::nullable(target.clone()), target);
    }

    #[test]
    fn test_from_value_extraction() {
        assert_eq!(i64::from_value(Value::I32(7)).unwrap(), 7);
        assert_eq!(
            String::from_value(Value::from("abc")).unwrap(),
            "abc".to_string()
        );
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert!(matches!(
            i64::from_value(Value::Null),
            Err(Error::NonNullableNilTarget { .. })
        ));
        assert!(matches!(
            bool::from_value(Value::from("yes")),
            Err(Error::ConversionError { .. })
        ));
    }
}
