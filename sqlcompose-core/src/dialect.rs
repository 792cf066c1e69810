//! Database dialects: placeholder syntax, terminator rule and RETURNING support

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::typeconv::{converters, ConversionRegistry, RegistryBuilder};
use crate::{Error, SemanticType};

/// Supported database backend families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// `?` placeholders, `;` terminator, RETURNING supported, text-typed driver
    #[serde(alias = "sqlite3")]
    Sqlite,
    /// `$N` placeholders, no terminator, RETURNING supported
    #[serde(alias = "postgresql")]
    Postgres,
    /// `?` placeholders, `;` terminator, no RETURNING
    MySql,
}

impl DialectKind {
    pub fn name(&self) -> &'static str {
        match self {
            DialectKind::Sqlite => "sqlite",
            DialectKind::Postgres => "postgres",
            DialectKind::MySql => "mysql",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DialectKind::Sqlite),
            "postgres" | "postgresql" => Ok(DialectKind::Postgres),
            "mysql" => Ok(DialectKind::MySql),
            _ => Err(Error::UnknownDialect {
                name: s.to_string(),
            }),
        }
    }
}

/// A dialect descriptor together with its conversion registry
///
/// The registry is built when the dialect is constructed and never changes
/// afterwards; cloning a `Dialect` shares it.
///
/// # Examples
/// ```
/// use sqlcompose_core::Dialect;
///
/// let pg = Dialect::postgres();
/// assert_eq!(pg.placeholder(3), "$3");
/// assert_eq!(pg.terminator(), "");
/// assert!(!Dialect::mysql().supports_returning());
/// ```
#[derive(Debug, Clone)]
pub struct Dialect {
    kind: DialectKind,
    registry: Arc<ConversionRegistry>,
}

impl Dialect {
    /// A dialect with its preset conversion registry
    pub fn new(kind: DialectKind) -> Self {
        let registry = match kind {
            DialectKind::Sqlite => sqlite_registry(),
            DialectKind::Postgres => postgres_registry(),
            DialectKind::MySql => mysql_registry(),
        };
        Self::with_registry(kind, registry)
    }

    /// A dialect using a caller-built registry instead of the preset
    pub fn with_registry(kind: DialectKind, registry: ConversionRegistry) -> Self {
        Self {
            kind,
            registry: Arc::new(registry),
        }
    }

    pub fn sqlite() -> Self {
        Self::new(DialectKind::Sqlite)
    }

    pub fn postgres() -> Self {
        Self::new(DialectKind::Postgres)
    }

    pub fn mysql() -> Self {
        Self::new(DialectKind::MySql)
    }

    pub fn kind(&self) -> DialectKind {
        self.kind
    }

    /// Placeholder token for the 1-based bind `position`
    pub fn placeholder(&self, position: usize) -> String {
        match self.kind {
            DialectKind::Postgres => format!("${}", position),
            DialectKind::Sqlite | DialectKind::MySql => "?".to_string(),
        }
    }

    /// Whether placeholders carry their position
    pub fn is_positional(&self) -> bool {
        self.kind == DialectKind::Postgres
    }

    pub fn supports_returning(&self) -> bool {
        !matches!(self.kind, DialectKind::MySql)
    }

    /// Quote an identifier, doubling any embedded quote character
    pub fn quote(&self, identifier: &str) -> String {
        let q = match self.kind {
            DialectKind::MySql => '`',
            DialectKind::Sqlite | DialectKind::Postgres => '"',
        };
        let escaped = identifier.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Appended to top-level statements, empty when the dialect wants none
    pub fn terminator(&self) -> &'static str {
        match self.kind {
            DialectKind::Postgres => "",
            DialectKind::Sqlite | DialectKind::MySql => ";",
        }
    }

    pub fn registry(&self) -> &Arc<ConversionRegistry> {
        &self.registry
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl From<DialectKind> for Dialect {
    fn from(kind: DialectKind) -> Self {
        Dialect::new(kind)
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<DialectKind>().map(Dialect::new)
    }
}

// SQLite stores timestamps and booleans as text or integers and hands them back that way.
fn sqlite_registry() -> ConversionRegistry {
    let builder = RegistryBuilder::new()
        .register(
            SemanticType::Text,
            SemanticType::Timestamp,
            converters::string_to_timestamp,
        )
        .register(
            SemanticType::I64,
            SemanticType::Timestamp,
            converters::int64_to_timestamp,
        )
        .register(SemanticType::I64, SemanticType::Bool, converters::int64_to_bool)
        .register(SemanticType::Text, SemanticType::Bool, converters::string_to_bool)
        .register_default(SemanticType::Timestamp, converters::default_timestamp)
        .register_default(
            SemanticType::nullable(SemanticType::Timestamp),
            converters::default_nullable_timestamp,
        )
        .register_default(SemanticType::Bool, converters::default_bool)
        .register_default(SemanticType::Json, |value| match value {
            crate::Value::Json(_) => Ok(value.clone()),
            other => converters::string_to_json(other),
        });
    with_feature_types(builder).build()
}

fn postgres_registry() -> ConversionRegistry {
    let builder = RegistryBuilder::new().register(
        SemanticType::Text,
        SemanticType::Json,
        converters::string_to_json,
    );

    #[cfg(feature = "uuid-support")]
    let builder = builder.register(SemanticType::Text, SemanticType::Uuid, converters::to_uuid);

    builder.build()
}

// MySQL drivers return many text and temporal columns as raw bytes.
fn mysql_registry() -> ConversionRegistry {
    RegistryBuilder::new()
        .register(SemanticType::Bytes, SemanticType::Text, converters::bytes_to_string)
        .register(
            SemanticType::Text,
            SemanticType::Timestamp,
            converters::string_to_timestamp,
        )
        .register(
            SemanticType::Bytes,
            SemanticType::Timestamp,
            converters::bytes_to_timestamp,
        )
        .register(SemanticType::I64, SemanticType::Bool, converters::int64_to_bool)
        .register(SemanticType::I32, SemanticType::Bool, converters::int64_to_bool)
        .register_default(SemanticType::Timestamp, converters::default_timestamp)
        .register_default(SemanticType::Bool, converters::default_bool)
        .build()
}

#[allow(unused_mut)]
fn with_feature_types(mut builder: RegistryBuilder) -> RegistryBuilder {
    #[cfg(feature = "uuid-support")]
    {
        builder = builder
            .register(SemanticType::Text, SemanticType::Uuid, converters::to_uuid)
            .register(SemanticType::Bytes, SemanticType::Uuid, converters::to_uuid);
    }
    #[cfg(feature = "decimal-support")]
    {
        builder = builder
            .register(SemanticType::Text, SemanticType::Decimal, converters::to_decimal)
            .register(SemanticType::F64, SemanticType::Decimal, converters::to_decimal)
            .register(SemanticType::I64, SemanticType::Decimal, converters::to_decimal);
    }
    builder
}
