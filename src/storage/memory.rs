use super::client::{Operation, Row, StorageClient, StorageError, row_key, validate_row};
use super::schema::TableSchema;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

/// In-process relational store.
///
/// Structure: `table name -> primary key -> row`. Batches take the commit lock
/// exclusively and are fully validated before the first row changes, which
/// gives the same all-or-nothing behaviour as a database transaction. Reads
/// share the lock so they never observe half of a batch.
pub struct MemoryStore {
    tables: Arc<DashMap<String, DashMap<i64, Row>>>,
    schemas: Arc<DashMap<String, TableSchema>>,
    commit_lock: RwLock<()>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(DashMap::new()),
            schemas: Arc::new(DashMap::new()),
            commit_lock: RwLock::new(()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates losing (or regaining) the connection to the store.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
        tracing::debug!("MemoryStore availability set to {}", available);
    }

    /// Writes a row bypassing the router, for seeding broken states in tests.
    pub fn store_local(&self, table: &str, key: i64, row: Row) {
        let table_map = self
            .tables
            .entry(table.to_string())
            .or_insert_with(|| DashMap::new());
        table_map.insert(key, row);
    }

    /// Deletes a row bypassing the router.
    pub fn remove_local(&self, table: &str, key: i64) -> Option<Row> {
        self.tables
            .get(table)
            .and_then(|table_map| table_map.remove(&key).map(|(_, row)| row))
    }

    pub fn local_table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn local_row_count(&self) -> usize {
        self.tables.iter().map(|entry| entry.value().len()).sum()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory store is offline".to_string()))
        }
    }

    fn schema(&self, table: &str) -> Result<TableSchema, StorageError> {
        self.schemas
            .get(table)
            .map(|s| s.value().clone())
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    fn validate(&self, operation: &Operation) -> Result<(), StorageError> {
        let schema = self.schema(operation.table())?;
        if let Operation::Upsert { row, .. } = operation {
            validate_row(&schema, row)?;
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageClient for MemoryStore {
    async fn ensure_table(&self, schema: &TableSchema) -> Result<(), StorageError> {
        self.check_available()?;
        let _guard = self.commit_lock.write();

        if schema.primary_key().is_none() {
            return Err(StorageError::Constraint(format!(
                "table {} has no primary key",
                schema.name
            )));
        }

        self.schemas
            .entry(schema.name.clone())
            .or_insert_with(|| schema.clone());
        self.tables
            .entry(schema.name.clone())
            .or_insert_with(|| DashMap::new());
        Ok(())
    }

    async fn fetch(&self, table: &str, key: i64) -> Result<Option<Row>, StorageError> {
        self.check_available()?;
        let _guard = self.commit_lock.read();

        let table_map = self
            .tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        Ok(table_map.get(&key).map(|row| row.value().clone()))
    }

    async fn scan(
        &self,
        table: &str,
        order_by: &[&str],
        limit: usize,
    ) -> Result<Vec<Row>, StorageError> {
        self.check_available()?;
        let _guard = self.commit_lock.read();

        let table_map = self
            .tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;

        let mut rows: Vec<Row> = table_map.iter().map(|entry| entry.value().clone()).collect();
        rows.sort_by(|a, b| {
            order_by
                .iter()
                .map(|column| compare_values(a.get(*column), b.get(*column)))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn count(&self, table: &str) -> Result<u64, StorageError> {
        self.check_available()?;
        let _guard = self.commit_lock.read();

        self.tables
            .get(table)
            .map(|table_map| table_map.len() as u64)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    async fn apply(&self, operations: Vec<Operation>) -> Result<(), StorageError> {
        self.check_available()?;
        let _guard = self.commit_lock.write();

        for operation in &operations {
            self.validate(operation)?;
        }

        for operation in operations {
            match operation {
                Operation::Upsert { table, row } => {
                    let schema = self.schema(&table)?;
                    let key = row_key(&schema, &row)?;
                    self.store_local(&table, key, row);
                }
                Operation::Delete { table, key } => {
                    self.remove_local(&table, key);
                }
                Operation::Truncate { table } => {
                    if let Some(table_map) = self.tables.get(&table) {
                        table_map.clear();
                    }
                }
            }
        }

        Ok(())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
