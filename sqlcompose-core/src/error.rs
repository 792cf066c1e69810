//! Error types for sqlcompose

use thiserror::Error;

/// The main error type for statement composition, conversion and execution
#[derive(Error, Debug)]
pub enum Error {
    /// A clause name that does not correspond to any known clause kind
    #[error("sqlcompose: clause {clause:?} is invalid")]
    InvalidClause { clause: String },

    /// A known clause used in a position where it is not allowed
    #[error("sqlcompose: clause {clause:?} cannot be used in this position")]
    MisplacedClause { clause: String },

    /// COALESCE requires at least two arguments
    #[error("sqlcompose: COALESCE requires at least two arguments, got {count}")]
    InvalidCoalesceArgs { count: usize },

    /// RETURNING requested on a dialect that cannot produce it
    #[error("sqlcompose: dialect {dialect} does not support RETURNING")]
    UnsupportedReturning { dialect: String },

    /// An INSERT or VALUES clause with nothing to insert
    #[error("sqlcompose: no values to insert")]
    NoValuesToInsert,

    /// Every column was filtered out of an INSERT or UPDATE
    #[error("sqlcompose: no insertable columns found for table '{table}'")]
    NoInsertableColumns { table: String },

    /// A model whose schema differs from the one captured by the statement
    #[error("sqlcompose: model type {found} does not match statement type {expected}")]
    ModelTypeMismatch { expected: String, found: String },

    /// No converter, or the converter rejected the source value
    #[error("sqlcompose: cannot convert {from} to {to}: {message}")]
    ConversionError {
        from: String,
        to: String,
        message: String,
    },

    /// NULL read into a target that cannot represent it
    #[error("sqlcompose: cannot convert NULL to non-nullable type {target}")]
    NonNullableNilTarget { target: String },

    /// Rendering a statement that has no clauses
    #[error("sqlcompose: statement has no clauses")]
    EmptyStatement,

    /// A template whose markers disagree with its bound arguments
    #[error("sqlcompose: clause {clause:?} has {expected} placeholders but {found} arguments")]
    ArgumentCountMismatch {
        clause: String,
        expected: usize,
        found: usize,
    },

    /// ORDER BY or GROUP BY with no columns
    #[error("sqlcompose: clause {clause:?} requires at least one column")]
    EmptyColumnList { clause: String },

    /// A list value bound anywhere but an IN / NOT IN condition
    #[error("sqlcompose: clause {clause:?} binds a list value outside IN / NOT IN")]
    ListArgument { clause: String },

    /// Positional VALUES whose arity differs from the target column list
    #[error("sqlcompose: VALUES supplies {found} values for {expected} columns")]
    ValuesCountMismatch { expected: usize, found: usize },

    /// Dialect name that is not recognized
    #[error("sqlcompose: unknown dialect: {name}")]
    UnknownDialect { name: String },

    /// INSERT or UPDATE executed with neither VALUES nor a model
    #[error("sqlcompose: Exec requires at least one model")]
    MissingModel,

    /// A statement that does not produce rows was used as a query
    #[error("sqlcompose: {kind} statement does not return rows")]
    NotAQuery { kind: String },

    /// Exactly one row was expected but none came back
    #[error("sqlcompose: no rows in result set")]
    NoRows,

    /// Exactly one row was expected but more came back
    #[error("sqlcompose: expected exactly one row")]
    TooManyRows,

    /// Column lookup by name failed
    #[error("sqlcompose: column '{column}' not found in row")]
    ColumnNotFound { column: String },

    /// Database connection or execution error
    #[cfg(feature = "any")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type for sqlcompose operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new invalid clause error
    pub fn invalid_clause(clause: impl Into<String>) -> Self {
        Self::InvalidClause {
            clause: clause.into(),
        }
    }

    /// Create a new misplaced clause error
    pub fn misplaced_clause(clause: impl Into<String>) -> Self {
        Self::MisplacedClause {
            clause: clause.into(),
        }
    }

    /// Create a new conversion error
    pub fn conversion(
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConversionError {
            from: from.into(),
            to: to.into(),
            message: message.into(),
        }
    }

    /// Create a new model mismatch error
    pub fn model_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ModelTypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a new column not found error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// The offending clause name, for clause-level failures
    pub fn clause(&self) -> Option<&str> {
        match self {
            Self::InvalidClause { clause }
            | Self::MisplacedClause { clause }
            | Self::EmptyColumnList { clause }
            | Self::ListArgument { clause }
            | Self::ArgumentCountMismatch { clause, .. } => Some(clause),
            _ => None,
        }
    }
}
