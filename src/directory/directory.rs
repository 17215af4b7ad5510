use crate::error::{Result, RouterError};
use crate::placement::types::{Bucket, ProductId};
use crate::storage::client::{Operation, Row, StorageClient, StorageError};
use crate::storage::schema::{ColumnDef, ColumnType, TableSchema};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DIRECTORY_TABLE: &str = "product_shard_directory";
const KEY_COLUMN: &str = "product_id";
const BUCKET_COLUMN: &str = "bucket";

/// One row of the directory: the bucket a product currently lives in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub product_id: ProductId,
    pub bucket: Bucket,
}

/// Sort order for directory listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrder {
    /// Ascending product id.
    #[default]
    Key,
    /// Bucket name first (`cold` before `hot`), then product id.
    Bucket,
}

/// `product_shard_directory(product_id INTEGER PK, bucket TEXT CHECK IN ('hot','cold'))`
pub fn directory_schema() -> TableSchema {
    let buckets: Vec<&str> = Bucket::ALL.iter().map(|b| b.as_str()).collect();
    TableSchema {
        name: DIRECTORY_TABLE.to_string(),
        columns: vec![
            ColumnDef::new(KEY_COLUMN, ColumnType::Integer).primary_key(),
            ColumnDef::new(BUCKET_COLUMN, ColumnType::Text).allowed(&buckets),
        ],
    }
}

/// Durable product id -> bucket mapping, the single source of truth for placement.
pub struct Directory {
    store: Arc<dyn StorageClient>,
}

impl Directory {
    pub fn new(store: Arc<dyn StorageClient>) -> Self {
        Self { store }
    }

    /// Records `bucket` for `key`, overwriting any previous assignment.
    pub async fn set_bucket(&self, key: ProductId, bucket: Bucket) -> Result<()> {
        self.store.apply(vec![Self::assign_op(key, bucket)]).await?;
        tracing::debug!("Directory: product {} -> {}", key, bucket);
        Ok(())
    }

    /// Current assignment of `key`, or `None` when it was never placed.
    pub async fn get_bucket(&self, key: ProductId) -> Result<Option<Bucket>> {
        match self.store.fetch(DIRECTORY_TABLE, key.0).await? {
            Some(row) => Ok(Some(decode_entry(row)?.bucket)),
            None => Ok(None),
        }
    }

    /// Up to `limit` entries in the requested order.
    pub async fn entries(&self, order: EntryOrder, limit: usize) -> Result<Vec<DirectoryEntry>> {
        let order_by: &[&str] = match order {
            EntryOrder::Key => &[KEY_COLUMN],
            EntryOrder::Bucket => &[BUCKET_COLUMN, KEY_COLUMN],
        };

        self.store
            .scan(DIRECTORY_TABLE, order_by, limit)
            .await?
            .into_iter()
            .map(decode_entry)
            .collect()
    }

    /// The upsert `set_bucket` performs, for callers composing a larger batch.
    pub(crate) fn assign_op(key: ProductId, bucket: Bucket) -> Operation {
        let mut row = Row::new();
        row.insert(KEY_COLUMN.to_string(), key.0.into());
        row.insert(BUCKET_COLUMN.to_string(), bucket.as_str().into());
        Operation::Upsert {
            table: DIRECTORY_TABLE.to_string(),
            row,
        }
    }

    pub(crate) fn truncate_op() -> Operation {
        Operation::Truncate {
            table: DIRECTORY_TABLE.to_string(),
        }
    }
}

fn decode_entry(row: Row) -> Result<DirectoryEntry> {
    serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| {
        RouterError::StorageUnavailable(StorageError::Serialization(format!(
            "malformed directory row: {}",
            e
        )))
    })
}
