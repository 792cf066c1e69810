//! Result rows and their materialization through a dialect's conversion registry

use std::sync::Arc;

use crate::schema::RowSchema;
use crate::typeconv::{create_scan_targets, extract_values, ConversionRegistry};
use crate::{Error, FromValue, Result, SemanticType, Value};

/// One materialized result row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw value of column `name`
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    /// Extract column `name` as `T`
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self
            .value(name)
            .ok_or_else(|| Error::column_not_found(name))?;
        T::from_value(value.clone())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Types that can be built from a materialized row
pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self> {
        Ok(row)
    }
}

fn positional<T: FromValue>(values: &mut impl Iterator<Item = Value>, index: usize) -> Result<T> {
    let value = values
        .next()
        .ok_or_else(|| Error::column_not_found(format!("#{}", index)))?;
    T::from_value(value)
}

impl<A: FromValue> FromRow for (A,) {
    fn from_row(row: Row) -> Result<Self> {
        let mut values = row.into_values().into_iter();
        Ok((positional(&mut values, 0)?,))
    }
}

impl<A: FromValue, B: FromValue> FromRow for (A, B) {
    fn from_row(row: Row) -> Result<Self> {
        let mut values = row.into_values().into_iter();
        Ok((positional(&mut values, 0)?, positional(&mut values, 1)?))
    }
}

impl<A: FromValue, B: FromValue, C: FromValue> FromRow for (A, B, C) {
    fn from_row(row: Row) -> Result<Self> {
        let mut values = row.into_values().into_iter();
        Ok((
            positional(&mut values, 0)?,
            positional(&mut values, 1)?,
            positional(&mut values, 2)?,
        ))
    }
}

/// Rows as read from a backend, before conversion
///
/// Each column carries the semantic type the backend reported for it, or
/// `None` when the driver could not tell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRows {
    pub columns: Vec<(String, Option<SemanticType>)>,
    pub rows: Vec<Vec<Value>>,
}

impl RawRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Convert raw rows into `T`s following `schema`
///
/// Columns named by the schema come first, converted to their schema type;
/// any other result columns (a COALESCE, say) follow unchanged.
pub fn materialize<T: FromRow>(
    raw: RawRows,
    schema: &RowSchema,
    registry: &Arc<ConversionRegistry>,
) -> Result<Vec<T>> {
    if raw.rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut indexes = Vec::with_capacity(schema.len());
    let mut column_types = Vec::with_capacity(schema.len());
    for (name, _) in &schema.fields {
        let index = raw
            .columns
            .iter()
            .position(|(column, _)| column == name)
            .ok_or_else(|| Error::column_not_found(name))?;
        indexes.push(index);
        column_types.push(raw.columns[index].1.clone());
    }
    let extra: Vec<usize> = (0..raw.columns.len())
        .filter(|i| !indexes.contains(i))
        .collect();

    let mut names = schema.names();
    names.extend(extra.iter().map(|&i| raw.columns[i].0.clone()));

    let mut targets = create_scan_targets(&column_types, &schema.types(), registry)?;
    let mut out = Vec::with_capacity(raw.rows.len());
    for mut values in raw.rows {
        for (target, &index) in targets.iter_mut().zip(&indexes) {
            let value = values.get_mut(index).map(std::mem::take).unwrap_or_default();
            target.scan(value)?;
        }

        let mut converted = extract_values(&mut targets);
        converted.extend(
            extra
                .iter()
                .map(|&i| values.get_mut(i).map(std::mem::take).unwrap_or_default()),
        );
        out.push(T::from_row(Row::new(names.clone(), converted))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dialect;
    use chrono::{Datelike, NaiveDateTime};

    fn schema() -> RowSchema {
        RowSchema {
            model: "event".to_string(),
            fields: vec![
                ("id".to_string(), SemanticType::I64),
                ("at".to_string(), SemanticType::Timestamp),
                (
                    "done_at".to_string(),
                    SemanticType::nullable(SemanticType::Timestamp),
                ),
            ],
        }
    }

    fn raw() -> RawRows {
        RawRows {
            columns: vec![
                ("done_at".to_string(), Some(SemanticType::Text)),
                ("id".to_string(), Some(SemanticType::I64)),
                ("at".to_string(), Some(SemanticType::Text)),
                ("label".to_string(), None),
            ],
            rows: vec![vec![
                Value::Null,
                Value::I64(1),
                Value::from("2024-01-15 10:30:00"),
                Value::from("first"),
            ]],
        }
    }

    #[test]
    fn test_row_get() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::I64(3), Value::from("Ann")],
        );
        assert_eq!(row.get::<i64>("id").unwrap(), 3);
        assert_eq!(row.get::<String>("name").unwrap(), "Ann");
        assert!(matches!(
            row.get::<i64>("missing"),
            Err(Error::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_materialize_converts_by_schema() {
        let dialect = Dialect::sqlite();
        let rows: Vec<Row> = materialize(raw(), &schema(), dialect.registry()).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.columns(), &["id", "at", "done_at", "label"]);
        assert_eq!(row.get::<i64>("id").unwrap(), 1);
        assert_eq!(row.get::<NaiveDateTime>("at").unwrap().year(), 2024);
        assert_eq!(row.get::<Option<NaiveDateTime>>("done_at").unwrap(), None);
        assert_eq!(row.get::<String>("label").unwrap(), "first");
    }

    #[test]
    fn test_materialize_into_tuples() {
        let dialect = Dialect::sqlite();
        let rows: Vec<(i64, NaiveDateTime)> =
            materialize(raw(), &schema(), dialect.registry()).unwrap();
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[0].1.month(), 1);
    }

    #[test]
    fn test_materialize_missing_column() {
        let mut raw = raw();
        raw.columns.remove(1);
        let err = materialize::<Row>(raw, &schema(), Dialect::sqlite().registry()).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { ref column } if column == "id"));
    }

    #[test]
    fn test_materialize_conversion_failure_aborts() {
        let mut raw = raw();
        raw.rows[0][2] = Value::from("not a time");
        assert!(materialize::<Row>(raw, &schema(), Dialect::sqlite().registry()).is_err());
    }

    #[test]
    fn test_materialize_empty() {
        let rows: Vec<Row> =
            materialize(RawRows::default(), &schema(), Dialect::sqlite().registry()).unwrap();
        assert!(rows.is_empty());
    }
}
