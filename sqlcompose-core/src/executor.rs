//! Statement execution against a database connection

use std::future::Future;

use tracing::debug;

use crate::row::{materialize, FromRow, RawRows};
use crate::{ClauseKind, Error, Model, Result, Statement, Value};

/// Trait for database connections and pools
///
/// The statement layer only produces SQL text and arguments; implementors
/// carry them to the backend.
pub trait Connection: Send + Sync {
    /// Execute a statement that returns no rows, yielding the affected row count
    fn execute(&self, sql: &str, args: &[Value]) -> impl Future<Output = Result<u64>> + Send;

    /// Execute a statement and read back every row unconverted
    fn query_rows(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<RawRows>> + Send;
}

fn needs_model(statement: &Statement) -> bool {
    matches!(
        statement.kind(),
        Some(ClauseKind::Insert) | Some(ClauseKind::Update)
    ) && !statement.has_values()
}

/// Execute `statement` once with its own arguments
pub async fn exec<C: Connection>(conn: &C, statement: &Statement) -> Result<u64> {
    if needs_model(statement) {
        return Err(Error::MissingModel);
    }

    let (sql, args) = statement.to_sql()?;
    debug!(sql = %sql, args_len = args.len(), "executing statement");
    conn.execute(&sql, &args).await
}

/// Execute `statement` once per model, returning the total affected rows
///
/// A statement that already carries VALUES runs once and ignores `models`.
pub async fn exec_models<C, M>(conn: &C, statement: &Statement, models: &[M]) -> Result<u64>
where
    C: Connection,
    M: Model,
{
    if !needs_model(statement) {
        return exec(conn, statement).await;
    }
    if models.is_empty() {
        return Err(Error::MissingModel);
    }

    let sql = statement.render()?;
    let mut affected = 0;
    for model in models {
        let args = statement.args_with_model(model)?;
        debug!(sql = %sql, args_len = args.len(), "executing statement for model");
        affected += conn.execute(&sql, &args).await?;
    }
    Ok(affected)
}

/// Run a row-producing statement and materialize every row as `T`
///
/// Column values go through the statement dialect's conversion registry.
pub async fn query<C, T>(conn: &C, statement: &Statement) -> Result<Vec<T>>
where
    C: Connection,
    T: FromRow,
{
    if !statement.returns_rows() {
        return Err(Error::NotAQuery {
            kind: statement
                .kind()
                .map(|k| k.name().to_string())
                .unwrap_or_default(),
        });
    }
    if needs_model(statement) {
        return Err(Error::MissingModel);
    }

    let schema = statement.result_schema()?;
    let (sql, args) = statement.to_sql()?;
    debug!(sql = %sql, args_len = args.len(), "querying rows");
    let raw = conn.query_rows(&sql, &args).await?;
    materialize(raw, &schema, statement.dialect().registry())
}

/// Like [`query`], but exactly one row must come back
pub async fn query_one<C, T>(conn: &C, statement: &Statement) -> Result<T>
where
    C: Connection,
    T: FromRow,
{
    let mut rows = query::<C, T>(conn, statement).await?;
    match rows.len() {
        0 => Err(Error::NoRows),
        1 => rows.pop().ok_or(Error::NoRows),
        _ => Err(Error::TooManyRows),
    }
}

#[cfg(feature = "any")]
mod any {
    use sqlx::any::{AnyArguments, AnyRow};
    use sqlx::query::Query;
    use sqlx::{Any, AnyPool, Column as _, Row as _, TypeInfo as _, ValueRef as _};

    use super::Connection;
    use crate::row::RawRows;
    use crate::{Error, Result, SemanticType, Value};

    type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

    const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    /// Bind parameter values to a sqlx query
    fn bind_value<'q>(query: AnyQuery<'q>, value: &Value) -> Result<AnyQuery<'q>> {
        let query = match value {
            Value::Null => query.bind(None::<i64>),
            Value::Bool(b) => query.bind(*b),
            Value::I32(i) => query.bind(*i),
            Value::I64(i) => query.bind(*i),
            Value::F64(f) => query.bind(*f),
            Value::String(s) => query.bind(s.clone()),
            Value::Bytes(b) => query.bind(b.clone()),
            Value::Json(j) => query.bind(j.to_string()),
            Value::Timestamp(ts) => query.bind(ts.format(TIMESTAMP_FORMAT).to_string()),
            #[cfg(feature = "uuid-support")]
            Value::Uuid(u) => query.bind(u.to_string()),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => query.bind(d.to_string()),
            Value::Array(_) => {
                return Err(Error::conversion(
                    "ARRAY",
                    "parameter",
                    "lists must be expanded into one placeholder per element",
                ))
            }
        };
        Ok(query)
    }

    fn bind_all<'q>(sql: &'q str, args: &[Value]) -> Result<AnyQuery<'q>> {
        let mut query = sqlx::query::<Any>(sql);
        for value in args {
            query = bind_value(query, value)?;
        }
        Ok(query)
    }

    fn semantic_type(type_name: &str) -> Option<SemanticType> {
        match type_name {
            "BOOLEAN" => Some(SemanticType::Bool),
            "SMALLINT" | "INTEGER" => Some(SemanticType::I32),
            "BIGINT" => Some(SemanticType::I64),
            "REAL" | "DOUBLE" => Some(SemanticType::F64),
            "TEXT" => Some(SemanticType::Text),
            "BLOB" => Some(SemanticType::Bytes),
            _ => None,
        }
    }

    fn read_value(row: &AnyRow, index: usize) -> Result<Value> {
        if row.try_get_raw(index)?.is_null() {
            return Ok(Value::Null);
        }

        let type_name = row.columns()[index].type_info().name().to_string();
        let value = match type_name.as_str() {
            "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(index)?),
            "SMALLINT" => Value::I32(row.try_get::<i16, _>(index)? as i32),
            "INTEGER" => Value::I32(row.try_get::<i32, _>(index)?),
            "BIGINT" => Value::I64(row.try_get::<i64, _>(index)?),
            "REAL" => Value::F64(row.try_get::<f32, _>(index)? as f64),
            "DOUBLE" => Value::F64(row.try_get::<f64, _>(index)?),
            "BLOB" => Value::Bytes(row.try_get::<Vec<u8>, _>(index)?),
            _ => Value::String(row.try_get::<String, _>(index)?),
        };
        Ok(value)
    }

    fn raw_rows(rows: Vec<AnyRow>) -> Result<RawRows> {
        let Some(first) = rows.first() else {
            return Ok(RawRows::default());
        };
        let columns = first
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), semantic_type(c.type_info().name())))
            .collect();

        let rows = rows
            .iter()
            .map(|row| (0..row.columns().len()).map(|i| read_value(row, i)).collect())
            .collect::<Result<Vec<Vec<Value>>>>()?;
        Ok(RawRows { columns, rows })
    }

    impl Connection for AnyPool {
        async fn execute(&self, sql: &str, args: &[Value]) -> Result<u64> {
            let result = bind_all(sql, args)?.execute(self).await?;
            Ok(result.rows_affected())
        }

        async fn query_rows(&self, sql: &str, args: &[Value]) -> Result<RawRows> {
            let rows = bind_all(sql, args)?.fetch_all(self).await?;
            raw_rows(rows)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::User;
    use crate::{delete, insert, select, update, Column, Dialect, Model, Row, SemanticType, Table};
    use std::sync::Mutex;

    // In-memory connection recording every call
    #[derive(Default)]
    struct RecordingConnection {
        calls: Mutex<Vec<(String, Vec<Value>)>>,
        rows: RawRows,
        fail: bool,
    }

    impl RecordingConnection {
        fn with_rows(rows: RawRows) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, Vec<Value>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Connection for RecordingConnection {
        async fn execute(&self, sql: &str, args: &[Value]) -> Result<u64> {
            if self.fail {
                return Err(Error::NoRows);
            }
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), args.to_vec()));
            Ok(1)
        }

        async fn query_rows(&self, sql: &str, args: &[Value]) -> Result<RawRows> {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), args.to_vec()));
            Ok(self.rows.clone())
        }
    }

    fn ann() -> User {
        User {
            id: None,
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
        }
    }

    fn user_rows(count: usize) -> RawRows {
        RawRows {
            columns: vec![
                ("id".to_string(), Some(SemanticType::I64)),
                ("first_name".to_string(), Some(SemanticType::Text)),
                ("last_name".to_string(), Some(SemanticType::Text)),
            ],
            rows: (0..count)
                .map(|i| vec![Value::I64(i as i64 + 1), "Ann".into(), "Lee".into()])
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_exec_runs_once_per_model() {
        let conn = RecordingConnection::default();
        let stmt = insert(&Dialect::sqlite(), &User::table());

        let affected = exec_models(&conn, &stmt, &[ann(), ann()]).await.unwrap();
        assert_eq!(affected, 2);

        let calls = conn.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].0,
            "INSERT INTO user (id, first_name, last_name) VALUES (?, ?, ?);"
        );
        assert_eq!(
            calls[0].1,
            vec![Value::Null, Value::from("Ann"), Value::from("Lee")]
        );
    }

    #[tokio::test]
    async fn test_exec_with_values_runs_once() {
        let conn = RecordingConnection::default();
        let stmt = insert(&Dialect::postgres(), &User::table())
            .values_from(&ann())
            .unwrap();

        let affected = exec_models(&conn, &stmt, &[ann(), ann(), ann()]).await.unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            conn.calls()[0].0,
            "INSERT INTO user (first_name, last_name) VALUES ($1, $2)"
        );
    }

    #[tokio::test]
    async fn test_exec_without_model_fails() {
        let conn = RecordingConnection::default();
        let stmt = update(&Dialect::sqlite(), &User::table()).where_("id=?", [1]);
        assert!(matches!(exec(&conn, &stmt).await, Err(Error::MissingModel)));
        assert!(matches!(
            exec_models::<_, User>(&conn, &stmt, &[]).await,
            Err(Error::MissingModel)
        ));
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exec_delete() {
        let conn = RecordingConnection::default();
        let stmt = delete(&Dialect::sqlite(), &User::table()).where_("id=?", [5i64]);
        assert_eq!(exec(&conn, &stmt).await.unwrap(), 1);
        assert_eq!(
            conn.calls()[0],
            ("DELETE FROM user WHERE id=?;".to_string(), vec![Value::I64(5)])
        );
    }

    #[tokio::test]
    async fn test_exec_propagates_connection_errors() {
        let conn = RecordingConnection::failing();
        let stmt = delete(&Dialect::sqlite(), &User::table());
        assert!(exec(&conn, &stmt).await.is_err());
    }

    #[tokio::test]
    async fn test_exec_models_rejects_wrong_model() {
        struct Other;
        impl Model for Other {
            fn table() -> Table {
                Table::new("other").column(Column::new("x", SemanticType::I64))
            }
            fn values(&self) -> Vec<Value> {
                vec![Value::I64(1)]
            }
        }

        let conn = RecordingConnection::default();
        let stmt = insert(&Dialect::sqlite(), &User::table());
        let err = exec_models(&conn, &stmt, &[Other]).await.unwrap_err();
        assert!(matches!(err, Error::ModelTypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_query_materializes_rows() {
        let conn = RecordingConnection::with_rows(user_rows(2));
        let stmt = select(&Dialect::sqlite(), &User::table()).where_("last_name=?", ["Lee"]);

        let rows: Vec<Row> = query(&conn, &stmt).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get::<Option<i64>>("id").unwrap(), Some(2));
        assert_eq!(rows[0].get::<String>("first_name").unwrap(), "Ann");
    }

    #[tokio::test]
    async fn test_query_one_cardinality() {
        let stmt = select(&Dialect::sqlite(), &User::table());

        let one = RecordingConnection::with_rows(user_rows(1));
        let (id,): (Option<i64>,) = query_one(&one, &stmt).await.unwrap();
        assert_eq!(id, Some(1));

        let none = RecordingConnection::with_rows(user_rows(0));
        assert!(matches!(
            query_one::<_, Row>(&none, &stmt).await,
            Err(Error::NoRows)
        ));

        let many = RecordingConnection::with_rows(user_rows(3));
        assert!(matches!(
            query_one::<_, Row>(&many, &stmt).await,
            Err(Error::TooManyRows)
        ));
    }

    #[tokio::test]
    async fn test_query_rejects_statements_without_rows() {
        let conn = RecordingConnection::default();
        let stmt = delete(&Dialect::sqlite(), &User::table());
        let err = query::<_, Row>(&conn, &stmt).await.unwrap_err();
        assert!(matches!(err, Error::NotAQuery { ref kind } if kind == "DELETE"));
    }

    #[test]
    fn test_query_returning() {
        let rows = RawRows {
            columns: vec![("id".to_string(), Some(SemanticType::I64))],
            rows: vec![vec![Value::I64(9)]],
        };
        let conn = RecordingConnection::with_rows(rows);
        let stmt = delete(&Dialect::sqlite(), &User::table())
            .where_("id=?", [9i64])
            .returning("id");

        let row: Row = tokio_test::block_on(query_one(&conn, &stmt)).unwrap();
        assert_eq!(row.get::<Option<i64>>("id").unwrap(), Some(9));
        assert_eq!(conn.calls()[0].0, "DELETE FROM user WHERE id=? RETURNING id;");
    }
}
