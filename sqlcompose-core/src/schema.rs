//! Table and column metadata used to derive clause column lists and row schemas

use crate::{Error, Result, SemanticType, Value};

/// A database column with its semantic type and constraints
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: SemanticType,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
}

impl Column {
    /// Create a new NOT NULL column
    pub fn new(name: &str, ty: SemanticType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            nullable: false,
            primary_key: false,
            auto_increment: false,
        }
    }

    /// Allow NULL in this column
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark this column as the primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark this column as database-assigned
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// The type a scanned value of this column is converted to
    pub fn semantic_type(&self) -> SemanticType {
        if self.nullable {
            SemanticType::nullable(self.ty.clone())
        } else {
            self.ty.clone()
        }
    }
}

/// A table definition: name, model identity and ordered columns
///
/// # Examples
/// ```
/// use sqlcompose_core::{Column, SemanticType, Table};
///
/// let users = Table::new("user")
///     .column(Column::new("id", SemanticType::I64).primary_key().auto_increment())
///     .column(Column::new("first_name", SemanticType::Text));
/// assert_eq!(users.column_names(), vec!["id", "first_name"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    model: String,
    columns: Vec<Column>,
}

impl Table {
    /// Create a table whose model identity is its name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            model: name.to_string(),
            columns: Vec::new(),
        }
    }

    /// Append a column
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Use a different table name while keeping the model identity
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Keep only the named columns, in schema order
    pub fn only(&self, fields: &[&str]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| fields.contains(&c.name.as_str()))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Capture the row schema of this table
    pub fn row_schema(&self) -> RowSchema {
        RowSchema {
            model: self.model.clone(),
            fields: self
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.semantic_type()))
                .collect(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Ordered (column name, semantic type) pairs captured when a clause is built
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSchema {
    pub model: String,
    pub fields: Vec<(String, SemanticType)>,
}

impl RowSchema {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn types(&self) -> Vec<SemanticType> {
        self.fields.iter().map(|(_, ty)| ty.clone()).collect()
    }
}

/// A value type with a statically declared table layout
pub trait Model {
    /// The full table definition for this model
    fn table() -> Table;

    /// Field values in the column order of [`Model::table`]
    fn values(&self) -> Vec<Value>;
}

/// Pick the model's values for the captured schema, checking that the model matches it
pub(crate) fn bind_model<M: Model>(schema: &RowSchema, model: &M) -> Result<Vec<(String, Value)>> {
    let table = M::table();
    if table.model() != schema.model {
        return Err(Error::model_mismatch(&schema.model, table.model()));
    }

    let values = model.values();
    if values.len() != table.columns().len() {
        return Err(Error::model_mismatch(
            &schema.model,
            format!("{} ({} values)", table.model(), values.len()),
        ));
    }

    let mut bound = Vec::with_capacity(schema.len());
    for (name, ty) in &schema.fields {
        let index = table
            .columns()
            .iter()
            .position(|c| &c.name == name && &c.semantic_type() == ty)
            .ok_or_else(|| Error::model_mismatch(&schema.model, table.model()))?;
        bound.push((name.clone(), values[index].clone()));
    }
    Ok(bound)
}

/// Model values to write, dropping auto-increment columns left NULL
pub(crate) fn insertable_values<M: Model>(
    schema: &RowSchema,
    table: &str,
    model: &M,
) -> Result<Vec<(String, Value)>> {
    let full = M::table();
    let bound: Vec<(String, Value)> = bind_model(schema, model)?
        .into_iter()
        .filter(|(name, value)| {
            let generated = full.find(name).is_some_and(|c| c.auto_increment);
            !(generated && value.is_null())
        })
        .collect();

    if bound.is_empty() {
        return Err(Error::NoInsertableColumns {
            table: table.to_string(),
        });
    }
    Ok(bound)
}
