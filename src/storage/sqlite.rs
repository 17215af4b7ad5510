use super::client::{Operation, Row, StorageClient, StorageError, row_key, validate_row};
use super::schema::TableSchema;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use rusqlite::types::{ToSql, ValueRef};
use rusqlite::{Connection, params_from_iter};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Relational store backed by SQLite.
///
/// Every statement runs on tokio's blocking pool. Batches run inside one
/// SQLite transaction and single rows are written with
/// `INSERT .. ON CONFLICT DO UPDATE`, so concurrent first writers of a key
/// never produce duplicate rows.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    schemas: Arc<DashMap<String, TableSchema>>,
}

impl SqliteStore {
    /// Opens (or creates) a database file.
    #[instrument(skip_all, fields(path = %path))]
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
        debug!("Opened SqliteStore at {}", path);
        Ok(Self::from_connection(conn))
    }

    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        debug!("Opened in-memory SqliteStore");
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            schemas: Arc::new(DashMap::new()),
        }
    }

    /// Only tables declared through `ensure_table` may be named in SQL.
    fn schema(&self, table: &str) -> Result<TableSchema, StorageError> {
        self.schemas
            .get(table)
            .map(|s| s.value().clone())
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    async fn run_blocking<T, F>(&self, job: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            job(&mut guard)
        })
        .await?
    }
}

#[async_trait]
impl StorageClient for SqliteStore {
    #[instrument(skip_all, fields(table = %schema.name))]
    async fn ensure_table(&self, schema: &TableSchema) -> Result<(), StorageError> {
        if schema.primary_key().is_none() {
            return Err(StorageError::Constraint(format!(
                "table {} has no primary key",
                schema.name
            )));
        }

        let sql = schema.create_sql();
        debug!("CREATE TABLE SQL: {}", sql);
        self.run_blocking(move |conn| {
            conn.execute(&sql, [])?;
            Ok(())
        })
        .await?;

        self.schemas.insert(schema.name.clone(), schema.clone());
        Ok(())
    }

    async fn fetch(&self, table: &str, key: i64) -> Result<Option<Row>, StorageError> {
        let schema = self.schema(table)?;
        let pk = schema
            .primary_key()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let sql = format!("SELECT * FROM \"{}\" WHERE \"{}\" = ?1", schema.name, pk);

        self.run_blocking(move |conn| {
            let mut rows = query_rows(conn, &sql, &[&key as &dyn ToSql])?;
            Ok(rows.pop())
        })
        .await
    }

    async fn scan(
        &self,
        table: &str,
        order_by: &[&str],
        limit: usize,
    ) -> Result<Vec<Row>, StorageError> {
        let schema = self.schema(table)?;
        for column in order_by {
            if schema.column(column).is_none() {
                return Err(StorageError::Constraint(format!(
                    "{} has no column {}",
                    schema.name, column
                )));
            }
        }

        let mut sql = format!("SELECT * FROM \"{}\"", schema.name);
        if !order_by.is_empty() {
            let columns: Vec<String> = order_by.iter().map(|c| format!("\"{}\"", c)).collect();
            sql.push_str(&format!(" ORDER BY {}", columns.join(", ")));
        }
        sql.push_str(" LIMIT ?1");
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.run_blocking(move |conn| query_rows(conn, &sql, &[&limit as &dyn ToSql]))
            .await
    }

    async fn count(&self, table: &str) -> Result<u64, StorageError> {
        let schema = self.schema(table)?;
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", schema.name);

        self.run_blocking(move |conn| {
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    #[instrument(skip_all, fields(operations = operations.len()))]
    async fn apply(&self, operations: Vec<Operation>) -> Result<(), StorageError> {
        let mut statements: Vec<(String, Vec<Value>)> = Vec::with_capacity(operations.len());

        for operation in &operations {
            let schema = self.schema(operation.table())?;
            statements.push(render(&schema, operation)?);
        }

        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            for (sql, params) in &statements {
                let values: Vec<Box<dyn ToSql>> = params.iter().map(json_to_sql).collect();
                tx.execute(sql, params_from_iter(values.iter()))?;
            }
            tx.commit()?;
            debug!("Committed batch of {} statements", statements.len());
            Ok(())
        })
        .await
    }
}

/// Turns an operation into SQL plus its bound parameters.
fn render(schema: &TableSchema, operation: &Operation) -> Result<(String, Vec<Value>), StorageError> {
    let pk = schema
        .primary_key()
        .map(|c| c.name.clone())
        .ok_or_else(|| StorageError::Constraint(format!("table {} has no primary key", schema.name)))?;

    match operation {
        Operation::Upsert { row, .. } => {
            validate_row(schema, row)?;
            let key = row_key(schema, row)?;

            let columns: Vec<&String> = schema
                .columns
                .iter()
                .map(|c| &c.name)
                .collect();
            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            let updates: Vec<String> = columns
                .iter()
                .filter(|c| ***c != pk)
                .map(|c| format!("\"{0}\" = excluded.\"{0}\"", c))
                .collect();

            let quoted: Vec<String> = columns.iter().map(|c| format!("\"{}\"", c)).collect();
            let conflict = if updates.is_empty() {
                "DO NOTHING".to_string()
            } else {
                format!("DO UPDATE SET {}", updates.join(", "))
            };
            let sql = format!(
                "INSERT INTO \"{}\" ({}) VALUES ({}) ON CONFLICT (\"{}\") {}",
                schema.name,
                quoted.join(", "),
                placeholders.join(", "),
                pk,
                conflict
            );

            let params = columns
                .iter()
                .map(|c| {
                    if **c == pk {
                        Value::from(key)
                    } else {
                        row.get(c.as_str()).cloned().unwrap_or(Value::Null)
                    }
                })
                .collect();
            Ok((sql, params))
        }
        Operation::Delete { key, .. } => Ok((
            format!("DELETE FROM \"{}\" WHERE \"{}\" = ?1", schema.name, pk),
            vec![Value::from(*key)],
        )),
        Operation::Truncate { .. } => Ok((format!("DELETE FROM \"{}\"", schema.name), Vec::new())),
    }
}

fn query_rows(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StorageError> {
    let mut stmt = conn.prepare(sql)?;
    let col_names: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let rows = stmt.query_map(params, |row| {
        let mut map = Row::new();
        for (i, col_name) in col_names.iter().enumerate() {
            let value = match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(n) => Value::from(n),
                ValueRef::Real(f) => serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
            };
            map.insert(col_name.clone(), value);
        }
        Ok(map)
    })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

fn json_to_sql(value: &Value) -> Box<dyn ToSql> {
    match value {
        Value::Null => Box::new(rusqlite::types::Null),
        Value::Bool(b) => Box::new(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Box::new(i)
            } else if let Some(f) = n.as_f64() {
                Box::new(f)
            } else {
                Box::new(n.to_string())
            }
        }
        Value::String(s) => Box::new(s.clone()),
        Value::Array(_) | Value::Object(_) => Box::new(value.to_string()),
    }
}
