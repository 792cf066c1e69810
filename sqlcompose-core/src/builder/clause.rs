//! Clause kinds and clause descriptors

use std::fmt;
use std::str::FromStr;

use super::Statement;
use crate::schema::{RowSchema, Table};
use crate::{Error, Result, Value};

/// The vocabulary of clause kinds a statement is assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Insert,
    Select,
    Update,
    Delete,
    Where,
    OrderBy,
    GroupBy,
    Having,
    Limit,
    Offset,
    Coalesce,
    Desc,
    Asc,
    Returning,
    Values,
    Join,
}

impl ClauseKind {
    /// The SQL keyword naming this clause
    pub fn name(&self) -> &'static str {
        match self {
            ClauseKind::Insert => "INSERT",
            ClauseKind::Select => "SELECT",
            ClauseKind::Update => "UPDATE",
            ClauseKind::Delete => "DELETE",
            ClauseKind::Where => "WHERE",
            ClauseKind::OrderBy => "ORDER BY",
            ClauseKind::GroupBy => "GROUP BY",
            ClauseKind::Having => "HAVING",
            ClauseKind::Limit => "LIMIT",
            ClauseKind::Offset => "OFFSET",
            ClauseKind::Coalesce => "COALESCE",
            ClauseKind::Desc => "DESC",
            ClauseKind::Asc => "ASC",
            ClauseKind::Returning => "RETURNING",
            ClauseKind::Values => "VALUES",
            ClauseKind::Join => "JOIN",
        }
    }

    /// Kinds that may open a statement
    pub fn is_leading(&self) -> bool {
        matches!(
            self,
            ClauseKind::Insert | ClauseKind::Select | ClauseKind::Update | ClauseKind::Delete
        )
    }

    /// Data-modifying leading kinds
    pub fn is_dml(&self) -> bool {
        matches!(
            self,
            ClauseKind::Insert | ClauseKind::Update | ClauseKind::Delete
        )
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClauseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('_', " ");
        let kind = match normalized.as_str() {
            "INSERT" => ClauseKind::Insert,
            "SELECT" => ClauseKind::Select,
            "UPDATE" => ClauseKind::Update,
            "DELETE" => ClauseKind::Delete,
            "WHERE" => ClauseKind::Where,
            "ORDER BY" => ClauseKind::OrderBy,
            "GROUP BY" => ClauseKind::GroupBy,
            "HAVING" => ClauseKind::Having,
            "LIMIT" => ClauseKind::Limit,
            "OFFSET" => ClauseKind::Offset,
            "COALESCE" => ClauseKind::Coalesce,
            "DESC" => ClauseKind::Desc,
            "ASC" => ClauseKind::Asc,
            "RETURNING" => ClauseKind::Returning,
            "VALUES" => ClauseKind::Values,
            "JOIN" => ClauseKind::Join,
            _ => return Err(Error::invalid_clause(s)),
        };
        Ok(kind)
    }
}

/// How a JOIN combines the nested rows with the outer ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single SQL fragment descriptor
///
/// Which fields are meaningful depends on `kind`:
/// leading clauses use `table_name`, `column_names` and `schema`;
/// WHERE, HAVING and JOIN use `expr` with `args`;
/// VALUES carries `args` and, when built from a model, the columns they belong to.
/// `distinct` only applies to SELECT and `join_kind` only to JOIN.
#[derive(Debug, Clone)]
pub struct Clause {
    pub kind: ClauseKind,
    pub table_name: String,
    pub column_names: Vec<String>,
    pub expr: String,
    pub args: Vec<Value>,
    pub nested: Option<Box<Statement>>,
    pub alias: String,
    pub schema: RowSchema,
    pub distinct: bool,
    pub join_kind: JoinKind,
}

impl Clause {
    /// A bare clause of `kind`; the typed constructors below are usually more convenient
    pub fn new(kind: ClauseKind) -> Self {
        Self {
            kind,
            table_name: String::new(),
            column_names: Vec::new(),
            expr: String::new(),
            args: Vec::new(),
            nested: None,
            alias: String::new(),
            schema: RowSchema::default(),
            distinct: false,
            join_kind: JoinKind::Inner,
        }
    }

    fn leading(kind: ClauseKind, table: &Table) -> Self {
        Self {
            table_name: table.name().to_string(),
            column_names: table.column_names(),
            schema: table.row_schema(),
            ..Self::new(kind)
        }
    }

    pub fn insert(table: &Table) -> Self {
        Self::leading(ClauseKind::Insert, table)
    }

    pub fn select(table: &Table) -> Self {
        Self::leading(ClauseKind::Select, table)
    }

    /// `SELECT DISTINCT`
    pub fn select_distinct(table: &Table) -> Self {
        Self {
            distinct: true,
            ..Self::leading(ClauseKind::Select, table)
        }
    }

    pub fn update(table: &Table) -> Self {
        Self::leading(ClauseKind::Update, table)
    }

    pub fn delete(table: &Table) -> Self {
        Self {
            column_names: Vec::new(),
            ..Self::leading(ClauseKind::Delete, table)
        }
    }

    fn template(kind: ClauseKind, expr: &str, args: Vec<Value>) -> Self {
        Self {
            expr: expr.to_string(),
            args,
            ..Self::new(kind)
        }
    }

    /// `WHERE <expr>`, with `?` marking each bound argument
    pub fn where_<A: IntoArgs>(expr: &str, args: A) -> Self {
        Self::template(ClauseKind::Where, expr, args.into_args())
    }

    pub fn having<A: IntoArgs>(expr: &str, args: A) -> Self {
        Self::template(ClauseKind::Having, expr, args.into_args())
    }

    fn columns<C: IntoColumns>(kind: ClauseKind, columns: C) -> Self {
        Self {
            column_names: columns.into_columns(),
            ..Self::new(kind)
        }
    }

    pub fn order_by<C: IntoColumns>(columns: C) -> Self {
        Self::columns(ClauseKind::OrderBy, columns)
    }

    pub fn group_by<C: IntoColumns>(columns: C) -> Self {
        Self::columns(ClauseKind::GroupBy, columns)
    }

    pub fn returning<C: IntoColumns>(columns: C) -> Self {
        Self::columns(ClauseKind::Returning, columns)
    }

    /// `COALESCE(<args>)` appended to the selected columns
    pub fn coalesce<C: IntoColumns>(args: C) -> Self {
        Self::columns(ClauseKind::Coalesce, args)
    }

    pub fn limit<V: Into<Value>>(limit: V) -> Self {
        Self {
            args: vec![limit.into()],
            ..Self::new(ClauseKind::Limit)
        }
    }

    pub fn offset<V: Into<Value>>(offset: V) -> Self {
        Self {
            args: vec![offset.into()],
            ..Self::new(ClauseKind::Offset)
        }
    }

    pub fn desc() -> Self {
        Self::new(ClauseKind::Desc)
    }

    pub fn asc() -> Self {
        Self::new(ClauseKind::Asc)
    }

    /// Positional values, one per column of the preceding INSERT or UPDATE
    ///
    /// Repeated VALUES after an INSERT add one row each.
    pub fn values<A: IntoArgs>(args: A) -> Self {
        Self {
            args: args.into_args(),
            ..Self::new(ClauseKind::Values)
        }
    }

    /// Values for an explicit column subset
    ///
    /// On INSERT the column list is replaced. On UPDATE the columns must be the
    /// SET columns in SET order.
    pub fn values_for<C: IntoColumns, A: IntoArgs>(columns: C, args: A) -> Self {
        Self {
            column_names: columns.into_columns(),
            args: args.into_args(),
            ..Self::new(ClauseKind::Values)
        }
    }

    /// `JOIN (<nested>) <alias> ON <on>`
    pub fn join<A: IntoArgs>(nested: Statement, alias: &str, on: &str, args: A) -> Self {
        Self {
            nested: Some(Box::new(nested)),
            alias: alias.to_string(),
            ..Self::template(ClauseKind::Join, on, args.into_args())
        }
    }

    pub fn left_join<A: IntoArgs>(nested: Statement, alias: &str, on: &str, args: A) -> Self {
        Self {
            join_kind: JoinKind::Left,
            ..Self::join(nested, alias, on, args)
        }
    }

    pub fn right_join<A: IntoArgs>(nested: Statement, alias: &str, on: &str, args: A) -> Self {
        Self {
            join_kind: JoinKind::Right,
            ..Self::join(nested, alias, on, args)
        }
    }
}

/// Trait for types that can be converted to column lists
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for (&str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

/// Trait for the bound arguments of a clause
pub trait IntoArgs {
    fn into_args(self) -> Vec<Value>;
}

impl IntoArgs for () {
    fn into_args(self) -> Vec<Value> {
        Vec::new()
    }
}

impl IntoArgs for Vec<Value> {
    fn into_args(self) -> Vec<Value> {
        self
    }
}

impl<T: Into<Value>, const N: usize> IntoArgs for [T; N] {
    fn into_args(self) -> Vec<Value> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<A: Into<Value>> IntoArgs for (A,) {
    fn into_args(self) -> Vec<Value> {
        vec![self.0.into()]
    }
}

impl<A: Into<Value>, B: Into<Value>> IntoArgs for (A, B) {
    fn into_args(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into()]
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> IntoArgs for (A, B, C) {
    fn into_args(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>, D: Into<Value>> IntoArgs for (A, B, C, D) {
    fn into_args(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into(), self.2.into(), self.3.into()]
    }
}
