//! Storage Client Abstraction
//!
//! The router never talks to a concrete driver. It is handed an
//! `Arc<dyn StorageClient>` offering keyed reads, counts, ordered scans and an
//! atomic batch of writes. Rows are JSON objects keyed by column name, the
//! primary key column included.

use super::schema::TableSchema;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single table row, column name -> value.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("table not found: {0}")]
    TableNotFound(String),

    /// A row violates the table schema (missing key, value outside a CHECK set).
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One write inside an atomic batch.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Insert the row, or update every non-key column when the key exists.
    Upsert { table: String, row: Row },
    /// Remove the row with this primary key. Absent rows are not an error.
    Delete { table: String, key: i64 },
    /// Remove every row of the table.
    Truncate { table: String },
}

impl Operation {
    pub fn table(&self) -> &str {
        match self {
            Operation::Upsert { table, .. }
            | Operation::Delete { table, .. }
            | Operation::Truncate { table } => table,
        }
    }
}

/// Relational storage consumed by the directory and the router.
///
/// Implementations must be safe to share between tasks. `apply` is the only
/// write path and is all-or-nothing: when it returns an error no operation of
/// the batch is visible.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Creates the table if it does not exist yet.
    async fn ensure_table(&self, schema: &TableSchema) -> Result<(), StorageError>;

    /// Row with the given primary key, or `None`.
    async fn fetch(&self, table: &str, key: i64) -> Result<Option<Row>, StorageError>;

    /// Up to `limit` rows sorted ascending by the `order_by` columns.
    async fn scan(
        &self,
        table: &str,
        order_by: &[&str],
        limit: usize,
    ) -> Result<Vec<Row>, StorageError>;

    async fn count(&self, table: &str) -> Result<u64, StorageError>;

    async fn apply(&self, operations: Vec<Operation>) -> Result<(), StorageError>;

    async fn upsert(&self, table: &str, row: Row) -> Result<(), StorageError> {
        self.apply(vec![Operation::Upsert {
            table: table.to_string(),
            row,
        }])
        .await
    }
}

/// Reads the primary key of `row` according to `schema`.
pub fn row_key(schema: &TableSchema, row: &Row) -> Result<i64, StorageError> {
    let pk = schema.primary_key().ok_or_else(|| {
        StorageError::Constraint(format!("table {} has no primary key", schema.name))
    })?;

    row.get(&pk.name)
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            StorageError::Constraint(format!(
                "row for {} is missing integer key column {}",
                schema.name, pk.name
            ))
        })
}

/// Checks column presence and CHECK sets before a row is written.
pub fn validate_row(schema: &TableSchema, row: &Row) -> Result<(), StorageError> {
    row_key(schema, row)?;

    for column in &schema.columns {
        let value = row.get(&column.name).filter(|v| !v.is_null()).ok_or_else(|| {
            StorageError::Constraint(format!(
                "{}.{} must not be null",
                schema.name, column.name
            ))
        })?;

        if let Some(allowed) = &column.allowed {
            let text = value.as_str().unwrap_or_default();
            if !allowed.iter().any(|a| a == text) {
                return Err(StorageError::Constraint(format!(
                    "{}.{} value {} is not one of {:?}",
                    schema.name, column.name, value, allowed
                )));
            }
        }
    }

    if let Some(extra) = row.keys().find(|k| schema.column(k).is_none()) {
        return Err(StorageError::Constraint(format!(
            "{} has no column {}",
            schema.name, extra
        )));
    }

    Ok(())
}
