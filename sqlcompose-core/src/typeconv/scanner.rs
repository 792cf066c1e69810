//! Scanning adapters that convert raw column values on the way out of a row

use std::sync::Arc;

use super::registry::ConversionRegistry;
use crate::{Error, Result, SemanticType, Value};

/// A destination for one column of a result row
pub trait ScanTarget: Send {
    /// Accept the raw value read from the backend
    fn scan(&mut self, raw: Value) -> Result<()>;

    /// The converted value, `None` until a successful scan
    fn result(&self) -> Option<&Value>;

    /// Move the converted value out, leaving the target empty
    fn take(&mut self) -> Option<Value>;
}

/// Converts through a [`ConversionRegistry`] before storing
#[derive(Debug)]
pub struct ConvertingScanner {
    registry: Arc<ConversionRegistry>,
    target: SemanticType,
    result: Option<Value>,
}

impl ConvertingScanner {
    pub fn new(registry: Arc<ConversionRegistry>, target: SemanticType) -> Self {
        Self {
            registry,
            target,
            result: None,
        }
    }

    pub fn target(&self) -> &SemanticType {
        &self.target
    }
}

impl ScanTarget for ConvertingScanner {
    fn scan(&mut self, raw: Value) -> Result<()> {
        let converted = self.registry.convert(&raw, &self.target)?;
        self.result = Some(converted);
        Ok(())
    }

    fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    fn take(&mut self) -> Option<Value> {
        self.result.take()
    }
}

/// Stores the raw value unchanged; used when the column already has the target type
#[derive(Debug)]
pub struct DirectScanner {
    target: SemanticType,
    result: Option<Value>,
}

impl DirectScanner {
    pub fn new(target: SemanticType) -> Self {
        Self {
            target,
            result: None,
        }
    }
}

impl ScanTarget for DirectScanner {
    fn scan(&mut self, raw: Value) -> Result<()> {
        if raw.is_null() && !self.target.is_nullable() {
            return Err(Error::NonNullableNilTarget {
                target: self.target.to_string(),
            });
        }
        self.result = Some(raw);
        Ok(())
    }

    fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    fn take(&mut self) -> Option<Value> {
        self.result.take()
    }
}

/// One scan target per result column
///
/// `column_types` holds the backend's reported type for each column, `None`
/// when the driver cannot tell. Columns whose reported type needs a converter
/// for the expected type get a [`ConvertingScanner`]; unknown columns always do,
/// so that a registered default still gets a chance to run.
pub fn create_scan_targets(
    column_types: &[Option<SemanticType>],
    expected: &[SemanticType],
    registry: &Arc<ConversionRegistry>,
) -> Result<Vec<Box<dyn ScanTarget>>> {
    if column_types.len() != expected.len() {
        return Err(Error::ArgumentCountMismatch {
            clause: "SCAN".to_string(),
            expected: expected.len(),
            found: column_types.len(),
        });
    }

    let targets = column_types
        .iter()
        .zip(expected)
        .map(|(source, target)| -> Box<dyn ScanTarget> {
            let convert = match source {
                Some(source) => registry.needs_conversion(source, target),
                None => true,
            };
            if convert {
                Box::new(registry.scanner(target.clone()))
            } else {
                Box::new(DirectScanner::new(target.clone()))
            }
        })
        .collect();
    Ok(targets)
}

/// Move the scanned values out of each target, NULL for targets never scanned
pub fn extract_values(targets: &mut [Box<dyn ScanTarget>]) -> Vec<Value> {
    targets
        .iter_mut()
        .map(|target| target.take().unwrap_or(Value::Null))
        .collect()
}
