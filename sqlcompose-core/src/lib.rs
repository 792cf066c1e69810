//! sqlcompose core - a composable, dialect-aware SQL statement builder
//!
//! Statements are assembled from clauses, validated for clause ordering and
//! rendered to dialect-correct SQL plus a positional argument list. Each
//! dialect also carries a conversion registry that reconciles the value
//! representations different backends return for the same logical type.
//!
//! ```
//! use sqlcompose_core::{select, Column, Dialect, SemanticType, Table};
//!
//! let users = Table::new("user")
//!     .column(Column::new("id", SemanticType::I64))
//!     .column(Column::new("first_name", SemanticType::Text));
//!
//! let sql = select(&Dialect::sqlite(), &users).render().unwrap();
//! assert_eq!(sql, "SELECT id, first_name FROM user;");
//! ```

pub mod builder;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod operator;
pub mod row;
pub mod schema;
pub mod typeconv;
pub mod value;

// Re-export main types
pub use builder::{delete, insert, select, select_distinct, update};
pub use builder::{Clause, ClauseKind, IntoArgs, IntoColumns, JoinKind, Statement};
pub use dialect::{Dialect, DialectKind};
pub use error::{Error, Result};
pub use executor::{exec, exec_models, query, query_one, Connection};
pub use operator::{op, IntoCondition, IntoOperator, Operator};
pub use row::{materialize, FromRow, RawRows, Row};
pub use schema::{Column, Model, RowSchema, Table};
pub use typeconv::{ConversionRegistry, RegistryBuilder};
pub use value::{FromValue, SemanticType, Value};
