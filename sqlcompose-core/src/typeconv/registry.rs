//! Per-dialect conversion registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::scanner::ConvertingScanner;
use crate::{Error, Result, SemanticType, Value};

/// A function converting a scanned value into a target representation
pub type ConverterFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// A (source, target) key for exact converters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePair {
    pub source: SemanticType,
    pub target: SemanticType,
}

/// Collects converters before freezing them into a [`ConversionRegistry`]
#[derive(Default, Clone)]
pub struct RegistryBuilder {
    converters: HashMap<TypePair, ConverterFn>,
    defaults: HashMap<SemanticType, ConverterFn>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter for one source -> target pair
    pub fn register<F>(mut self, source: SemanticType, target: SemanticType, converter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.converters
            .insert(TypePair { source, target }, Arc::new(converter));
        self
    }

    /// Register the converter used for `target` when no exact pair matches
    pub fn register_default<F>(mut self, target: SemanticType, converter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.defaults.insert(target, Arc::new(converter));
        self
    }

    /// Freeze the registry; it cannot be modified afterwards
    pub fn build(self) -> ConversionRegistry {
        ConversionRegistry {
            converters: self.converters,
            defaults: self.defaults,
        }
    }
}

/// Immutable mapping of (source type, target type) to converters plus per-target defaults
///
/// Built once per dialect and shared read-only, so concurrent lookups need no locking.
///
/// # Examples
/// ```
/// use sqlcompose_core::{typeconv, SemanticType, Value};
///
/// let registry = typeconv::RegistryBuilder::new()
///     .register_default(SemanticType::Timestamp, typeconv::converters::default_timestamp)
///     .build();
/// let ts = registry.convert(&Value::from("2024-01-15 10:30:00"), &SemanticType::Timestamp).unwrap();
/// assert!(matches!(ts, Value::Timestamp(_)));
/// ```
#[derive(Clone, Default)]
pub struct ConversionRegistry {
    converters: HashMap<TypePair, ConverterFn>,
    defaults: HashMap<SemanticType, ConverterFn>,
}

impl ConversionRegistry {
    /// A registry without converters: only direct assignment succeeds
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Convert `value` into the `target` representation
    pub fn convert(&self, value: &Value, target: &SemanticType) -> Result<Value> {
        if value.is_null() {
            if target.is_nullable() {
                return Ok(Value::Null);
            }
            return Err(Error::NonNullableNilTarget {
                target: target.to_string(),
            });
        }

        let source = value.semantic_type().ok_or_else(|| {
            Error::conversion(value.type_name(), target.to_string(), "lists cannot be scanned")
        })?;

        let pair = TypePair {
            source: source.clone(),
            target: target.clone(),
        };
        if let Some(converter) = self.converters.get(&pair) {
            trace!(source = %source, target = %target, "exact converter");
            return converter(value);
        }

        if let Some(converter) = self.defaults.get(target) {
            trace!(source = %source, target = %target, "default converter");
            return converter(value);
        }

        if target.accepts(&source) {
            trace!(source = %source, target = %target, "pass-through");
            return Ok(value.clone());
        }

        // A present value for a nullable target converts like its inner type
        if let SemanticType::Nullable(inner) = target {
            return self.convert(value, inner);
        }

        Err(Error::conversion(
            source.to_string(),
            target.to_string(),
            "no converter registered",
        ))
    }

    /// Whether scanning `source` into `target` has to go through a converter
    pub fn needs_conversion(&self, source: &SemanticType, target: &SemanticType) -> bool {
        if target.accepts(source) {
            return false;
        }

        let pair = TypePair {
            source: source.clone(),
            target: target.clone(),
        };
        if self.converters.contains_key(&pair) || self.defaults.contains_key(target) {
            return true;
        }

        match target {
            SemanticType::Nullable(inner) => self.needs_conversion(source, inner),
            _ => false,
        }
    }

    /// Build a scanning adapter converting into `target`
    pub fn scanner(self: &Arc<Self>, target: SemanticType) -> ConvertingScanner {
        ConvertingScanner::new(Arc::clone(self), target)
    }

    pub fn len(&self) -> usize {
        self.converters.len() + self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<String> = self
            .converters
            .keys()
            .map(|pair| format!("{} -> {}", pair.source, pair.target))
            .collect();
        pairs.sort();
        let mut defaults: Vec<String> = self.defaults.keys().map(|t| t.to_string()).collect();
        defaults.sort();

        f.debug_struct("ConversionRegistry")
            .field("converters", &pairs)
            .field("defaults", &defaults)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typeconv::converters;
    use chrono::{Datelike, Timelike};

    fn nullable_timestamp() -> SemanticType {
        SemanticType::nullable(SemanticType::Timestamp)
    }

    #[test]
    fn test_direct_type_match_passes_through() {
        let registry = ConversionRegistry::empty();
        let out = registry
            .convert(&Value::from("hello"), &SemanticType::Text)
            .unwrap();
        assert_eq!(out, Value::from("hello"));
    }

    #[test]
    fn test_exact_converter() {
        let registry = ConversionRegistry::builder()
            .register(
                SemanticType::Text,
                SemanticType::Timestamp,
                converters::string_to_timestamp,
            )
            .build();
        let out = registry
            .convert(&Value::from("2024-01-15 10:30:00"), &SemanticType::Timestamp)
            .unwrap();
        match out {
            Value::Timestamp(ts) => {
                assert_eq!(ts.year(), 2024);
                assert_eq!(ts.month(), 1);
                assert_eq!(ts.day(), 15);
                assert_eq!(ts.minute(), 30);
            }
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_default_converter_handles_several_sources() {
        let registry = ConversionRegistry::builder()
            .register_default(SemanticType::Timestamp, converters::default_timestamp)
            .build();
        for source in [Value::from("2024-01-15 10:30:00"), Value::I64(1705318200)] {
            let out = registry.convert(&source, &SemanticType::Timestamp).unwrap();
            assert!(matches!(out, Value::Timestamp(ts) if ts.year() == 2024));
        }
    }

    #[test]
    fn test_exact_converter_wins_over_default() {
        let registry = ConversionRegistry::builder()
            .register(SemanticType::I64, SemanticType::Bool, |_| Ok(Value::Bool(true)))
            .register_default(SemanticType::Bool, |_| Ok(Value::Bool(false)))
            .build();
        assert_eq!(
            registry.convert(&Value::I64(0), &SemanticType::Bool).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            registry.convert(&Value::from("x"), &SemanticType::Bool).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_nil_into_nullable_is_invalid_not_error() {
        let registry = ConversionRegistry::empty();
        let out = registry.convert(&Value::Null, &nullable_timestamp()).unwrap();
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn test_nil_into_non_nullable_fails() {
        let registry = ConversionRegistry::empty();
        let err = registry
            .convert(&Value::Null, &SemanticType::Timestamp)
            .unwrap_err();
        assert!(matches!(err, Error::NonNullableNilTarget { .. }));
    }

    #[test]
    fn test_missing_converter_names_both_types() {
        let registry = ConversionRegistry::empty();
        let err = registry
            .convert(&Value::from("x"), &SemanticType::Timestamp)
            .unwrap_err();
        match err {
            Error::ConversionError { from, to, .. } => {
                assert_eq!(from, "TEXT");
                assert_eq!(to, "TIMESTAMP");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_converter_rejection_propagates() {
        let registry = ConversionRegistry::builder()
            .register(
                SemanticType::Text,
                SemanticType::Timestamp,
                converters::string_to_timestamp,
            )
            .build();
        assert!(registry
            .convert(&Value::from("not a time"), &SemanticType::Timestamp)
            .is_err());
    }

    #[test]
    fn test_nullable_target_uses_inner_converter() {
        let registry = ConversionRegistry::builder()
            .register(
                SemanticType::Text,
                SemanticType::Timestamp,
                converters::string_to_timestamp,
            )
            .build();
        let out = registry
            .convert(&Value::from("2024-01-15 10:30:00"), &nullable_timestamp())
            .unwrap();
        assert!(matches!(out, Value::Timestamp(_)));
        assert!(registry.needs_conversion(&SemanticType::Text, &nullable_timestamp()));
    }

    #[test]
    fn test_needs_conversion() {
        let registry = ConversionRegistry::builder()
            .register(
                SemanticType::Text,
                SemanticType::Timestamp,
                converters::string_to_timestamp,
            )
            .build();
        assert!(registry.needs_conversion(&SemanticType::Text, &SemanticType::Timestamp));
        assert!(!registry.needs_conversion(&SemanticType::Timestamp, &SemanticType::Timestamp));
        // no converter registered: scan directly and let the caller fail
        assert!(!registry.needs_conversion(&SemanticType::Bytes, &SemanticType::Timestamp));
    }

    #[test]
    fn test_debug_lists_registered_pairs() {
        let registry = ConversionRegistry::builder()
            .register(SemanticType::I64, SemanticType::Bool, converters::int64_to_bool)
            .build();
        let debug = format!("{:?}", registry);
        assert!(debug.contains("BIGINT -> BOOLEAN"));
        assert_eq!(registry.len(), 1);
    }
}
