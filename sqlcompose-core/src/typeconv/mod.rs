//! Cross-dialect type conversion
//!
//! Every backend reports column values in its own representation: SQLite hands
//! timestamps back as text, MySQL often returns text columns as bytes. A
//! [`ConversionRegistry`] maps those representations onto the semantic type a
//! row field expects. Each [`Dialect`](crate::Dialect) carries a preset registry.

pub mod converters;
mod registry;
mod scanner;

pub use registry::{ConversionRegistry, ConverterFn, RegistryBuilder, TypePair};
pub use scanner::{
    create_scan_targets, extract_values, ConvertingScanner, DirectScanner, ScanTarget,
};
