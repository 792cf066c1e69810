//! The Statement builder

use tracing::debug;

use super::clause::{IntoArgs, IntoColumns};
use super::{render, Clause, ClauseKind};
use crate::operator::IntoCondition;
use crate::schema::{bind_model, insertable_values, Model, RowSchema, Table};
use crate::{Dialect, Error, Result, Value};

/// An ordered sequence of clauses rendered for one dialect
///
/// Every builder method takes the statement by value and returns it with one
/// more clause, so a finished statement can be cloned and shared freely.
/// Rendering never mutates it.
///
/// # Examples
/// ```
/// use sqlcompose_core::{select, Column, Dialect, SemanticType, Table};
///
/// let users = Table::new("user")
///     .column(Column::new("id", SemanticType::I64))
///     .column(Column::new("first_name", SemanticType::Text));
///
/// let stmt = select(&Dialect::postgres(), &users).where_("id=?", [1]);
/// assert_eq!(stmt.render().unwrap(), "SELECT id, first_name FROM user WHERE id=$1");
/// assert_eq!(stmt.args().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Statement {
    dialect: Dialect,
    clauses: Vec<Clause>,
}

impl Statement {
    /// Start a statement with its leading clause
    pub fn new(dialect: &Dialect, leading: Clause) -> Self {
        Self::from_clauses(dialect, vec![leading])
    }

    /// Build a statement from a raw clause sequence; ordering is checked on render
    pub fn from_clauses(dialect: &Dialect, clauses: Vec<Clause>) -> Self {
        Self {
            dialect: dialect.clone(),
            clauses,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// The kind of the leading clause
    pub fn kind(&self) -> Option<ClauseKind> {
        self.clauses.first().map(|c| c.kind)
    }

    /// Append an arbitrary clause
    pub fn clause(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Add a WHERE clause; each `?` in `expr` binds the next argument
    pub fn where_<A: IntoArgs>(self, expr: &str, args: A) -> Self {
        self.clause(Clause::where_(expr, args))
    }

    /// Add a WHERE clause from a condition tuple
    ///
    /// # Examples
    /// ```
    /// use sqlcompose_core::{op, select, Column, Dialect, SemanticType, Table};
    ///
    /// let users = Table::new("user").column(Column::new("age", SemanticType::I32));
    /// let stmt = select(&Dialect::sqlite(), &users).where_cond(("age", op::GT, 18));
    /// assert_eq!(stmt.render().unwrap(), "SELECT age FROM user WHERE age > ?;");
    /// ```
    pub fn where_cond<C: IntoCondition>(self, condition: C) -> Self {
        let (expr, args) = condition.into_condition();
        self.clause(Clause::where_(&expr, args))
    }

    pub fn order_by<C: IntoColumns>(self, columns: C) -> Self {
        self.clause(Clause::order_by(columns))
    }

    pub fn group_by<C: IntoColumns>(self, columns: C) -> Self {
        self.clause(Clause::group_by(columns))
    }

    pub fn having<A: IntoArgs>(self, expr: &str, args: A) -> Self {
        self.clause(Clause::having(expr, args))
    }

    pub fn limit<V: Into<Value>>(self, limit: V) -> Self {
        self.clause(Clause::limit(limit))
    }

    pub fn offset<V: Into<Value>>(self, offset: V) -> Self {
        self.clause(Clause::offset(offset))
    }

    pub fn coalesce<C: IntoColumns>(self, args: C) -> Self {
        self.clause(Clause::coalesce(args))
    }

    pub fn desc(self) -> Self {
        self.clause(Clause::desc())
    }

    pub fn asc(self) -> Self {
        self.clause(Clause::asc())
    }

    pub fn returning<C: IntoColumns>(self, columns: C) -> Self {
        self.clause(Clause::returning(columns))
    }

    /// Positional values for the leading INSERT or UPDATE, in column order
    pub fn values<A: IntoArgs>(self, args: A) -> Self {
        self.clause(Clause::values(args))
    }

    /// Values taken from `model`
    ///
    /// On INSERT, auto-increment columns the model leaves NULL are dropped and
    /// the column list shrinks to match. On UPDATE, values follow the SET order.
    pub fn values_from<M: Model>(self, model: &M) -> Result<Self> {
        let leading = self.clauses.first().ok_or(Error::EmptyStatement)?;

        let clause = match leading.kind {
            ClauseKind::Insert => {
                let bound = insertable_values(&leading.schema, &leading.table_name, model)?;
                let (columns, values): (Vec<String>, Vec<Value>) = bound.into_iter().unzip();
                Clause::values_for(columns, values)
            }
            ClauseKind::Update => {
                let bound = bind_model(&leading.schema, model)?;
                let values: Vec<Value> = leading
                    .column_names
                    .iter()
                    .filter_map(|column| {
                        bound
                            .iter()
                            .find(|(name, _)| name == column)
                            .map(|(_, value)| value.clone())
                    })
                    .collect();
                Clause::values(values)
            }
            _ => return Err(Error::misplaced_clause(ClauseKind::Values.name())),
        };
        Ok(self.clause(clause))
    }

    /// `JOIN (<nested>) <alias> ON <on>`
    pub fn join<A: IntoArgs>(self, nested: Statement, alias: &str, on: &str, args: A) -> Self {
        self.clause(Clause::join(nested, alias, on, args))
    }

    pub fn left_join<A: IntoArgs>(self, nested: Statement, alias: &str, on: &str, args: A) -> Self {
        self.clause(Clause::left_join(nested, alias, on, args))
    }

    pub fn right_join<A: IntoArgs>(self, nested: Statement, alias: &str, on: &str, args: A) -> Self {
        self.clause(Clause::right_join(nested, alias, on, args))
    }

    /// Bound arguments in placeholder order
    pub fn args(&self) -> Vec<Value> {
        let mut args = Vec::new();
        for clause in &self.clauses {
            if let Some(nested) = &clause.nested {
                args.extend(nested.args());
            }
            args.extend(clause.args.iter().cloned());
        }
        args
    }

    /// Arguments for executing this statement once for `model`
    ///
    /// The leading INSERT or UPDATE binds the model's values for its captured
    /// columns, followed by the arguments of the remaining clauses.
    pub fn args_with_model<M: Model>(&self, model: &M) -> Result<Vec<Value>> {
        let leading = self.clauses.first().ok_or(Error::EmptyStatement)?;
        let bound = bind_model(&leading.schema, model)?;

        let mut args = Vec::new();
        if matches!(leading.kind, ClauseKind::Insert | ClauseKind::Update) {
            for column in &leading.column_names {
                let value = bound
                    .iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| Error::column_not_found(column))?;
                args.push(value);
            }
        }

        let rest = Statement {
            dialect: self.dialect.clone(),
            clauses: self.clauses[1..].to_vec(),
        };
        args.extend(rest.args());
        Ok(args)
    }

    /// Render to SQL text
    pub fn render(&self) -> Result<String> {
        let sql = render::render(self)?;
        debug!(sql = %sql, args_len = self.args().len(), dialect = %self.dialect, "rendered statement");
        Ok(sql)
    }

    /// Render to SQL text together with its arguments
    pub fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        Ok((self.render()?, self.args()))
    }

    /// Whether executing this statement yields rows
    pub fn returns_rows(&self) -> bool {
        match self.kind() {
            Some(ClauseKind::Select) => true,
            Some(kind) if kind.is_dml() => self
                .clauses
                .iter()
                .any(|c| c.kind == ClauseKind::Returning),
            _ => false,
        }
    }

    /// Whether a VALUES clause already supplies the write arguments
    pub fn has_values(&self) -> bool {
        self.clauses.iter().any(|c| c.kind == ClauseKind::Values)
    }

    /// The (column, type) layout of the rows this statement yields
    ///
    /// A SELECT yields its captured columns, a DML statement with RETURNING
    /// yields the returned columns as typed by the leading clause's schema.
    /// An empty RETURNING list renders as `*` and yields every column.
    pub fn result_schema(&self) -> Result<RowSchema> {
        let leading = self.clauses.first().ok_or(Error::EmptyStatement)?;
        if leading.kind == ClauseKind::Select {
            return Ok(leading.schema.clone());
        }

        let returning = self
            .clauses
            .iter()
            .find(|c| c.kind == ClauseKind::Returning)
            .ok_or_else(|| Error::NotAQuery {
                kind: leading.kind.name().to_string(),
            })?;
        if returning.column_names.is_empty() {
            return Ok(leading.schema.clone());
        }

        let mut fields = Vec::with_capacity(returning.column_names.len());
        for column in &returning.column_names {
            let field = leading
                .schema
                .fields
                .iter()
                .find(|(name, _)| name == column)
                .cloned()
                .ok_or_else(|| Error::column_not_found(column))?;
            fields.push(field);
        }
        Ok(RowSchema {
            model: leading.schema.model.clone(),
            fields,
        })
    }
}

/// SELECT every column of `table`
pub fn select(dialect: &Dialect, table: &Table) -> Statement {
    Statement::new(dialect, Clause::select(table))
}

/// SELECT DISTINCT over every column of `table`
pub fn select_distinct(dialect: &Dialect, table: &Table) -> Statement {
    Statement::new(dialect, Clause::select_distinct(table))
}

/// INSERT into every column of `table`
pub fn insert(dialect: &Dialect, table: &Table) -> Statement {
    Statement::new(dialect, Clause::insert(table))
}

/// UPDATE every column of `table`
pub fn update(dialect: &Dialect, table: &Table) -> Statement {
    Statement::new(dialect, Clause::update(table))
}

/// DELETE from `table`
pub fn delete(dialect: &Dialect, table: &Table) -> Statement {
    Statement::new(dialect, Clause::delete(table))
}
