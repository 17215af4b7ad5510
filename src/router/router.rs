use super::types::*;
use crate::directory::directory::{Directory, DirectoryEntry, directory_schema};
use crate::error::{Result, RouterError};
use crate::placement::policy::default_bucket;
use crate::placement::types::{Bucket, HotRatio, ProductId};
use crate::storage::client::{Operation, Row, StorageClient, StorageError};

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Upper bound of a `NUMERIC(10, 2)` price column.
const MAX_PRICE: i64 = 100_000_000;
/// Width of the `name` column.
const MAX_NAME_LEN: usize = 255;

/// Placement policy plus bucket-aware access to product rows.
///
/// The router is the only component that writes both the directory and the
/// bucket tables; every write it issues touches them in one atomic batch so
/// the directory always names the table that holds the row.
pub struct Router {
    directory: Directory,
    store: Arc<dyn StorageClient>,
    clock: Clock,
}

impl Router {
    pub fn new(store: Arc<dyn StorageClient>) -> Self {
        Self::with_clock(store, Arc::new(Utc::now))
    }

    pub fn with_clock(store: Arc<dyn StorageClient>, clock: Clock) -> Self {
        Self {
            directory: Directory::new(store.clone()),
            store,
            clock,
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Creates the directory and bucket tables when they are missing.
    pub async fn bootstrap(&self) -> Result<()> {
        self.store.ensure_table(&directory_schema()).await?;
        for bucket in Bucket::ALL {
            self.store.ensure_table(&product_schema(bucket)).await?;
        }
        tracing::info!("Router tables ready");
        Ok(())
    }

    /// The directory entry for `key`, creating it from the default policy
    /// when the key was never placed.
    ///
    /// Two callers racing on the same unseen key both persist the default;
    /// the upsert keeps a single row and the last write wins.
    pub async fn resolve_bucket(&self, key: ProductId, hot_ratio: HotRatio) -> Result<Bucket> {
        if let Some(bucket) = self.directory.get_bucket(key).await? {
            return Ok(bucket);
        }

        let bucket = default_bucket(key, hot_ratio);
        self.directory.set_bucket(key, bucket).await?;
        tracing::debug!(
            "Resolved product {} to default bucket {} (hot ratio {})",
            key,
            bucket,
            hot_ratio.value()
        );
        Ok(bucket)
    }

    /// Inserts or updates a product in its bucket.
    ///
    /// The bucket is chosen as: `explicit_bucket`, else the directory entry,
    /// else the default policy. The directory row, the product row and the
    /// removal of the key from every other bucket table commit together.
    pub async fn upsert_product(
        &self,
        key: ProductId,
        name: &str,
        price: Decimal,
        explicit_bucket: Option<Bucket>,
        default_hot_ratio: HotRatio,
    ) -> Result<Bucket> {
        let item = ProductUpsert {
            product_id: key,
            name: name.to_string(),
            price,
            bucket: explicit_bucket,
        };
        let item = validate(item)?;

        let current = match item.bucket {
            Some(_) => None,
            None => self.directory.get_bucket(key).await?,
        };
        let (bucket, operations) = self.plan(&item, current, default_hot_ratio, self.now())?;

        self.store.apply(operations).await?;
        tracing::debug!("Upserted product {} into {}", key, bucket);
        Ok(bucket)
    }

    /// Writes many products in one atomic batch.
    ///
    /// Each item is placed with the same priority as [`Router::upsert_product`];
    /// a later item for the same key sees the decision made for the earlier one.
    /// If the storage rejects the batch nothing is written.
    pub async fn upsert_batch(
        &self,
        items: Vec<ProductUpsert>,
        default_hot_ratio: HotRatio,
    ) -> Result<Vec<DirectoryEntry>> {
        let items = items
            .into_iter()
            .map(validate)
            .collect::<Result<Vec<_>>>()?;

        let now = self.now();
        let mut planned: HashMap<ProductId, Bucket> = HashMap::new();
        let mut operations = Vec::with_capacity(items.len() * (Bucket::ALL.len() + 1));
        let mut placements = Vec::with_capacity(items.len());

        for item in &items {
            let current = match (item.bucket, planned.get(&item.product_id)) {
                (Some(_), _) => None,
                (None, Some(bucket)) => Some(*bucket),
                (None, None) => self.directory.get_bucket(item.product_id).await?,
            };

            let (bucket, ops) = self.plan(item, current, default_hot_ratio, now)?;
            planned.insert(item.product_id, bucket);
            operations.extend(ops);
            placements.push(DirectoryEntry {
                product_id: item.product_id,
                bucket,
            });
        }

        self.store.apply(operations).await?;
        tracing::info!("Upserted batch of {} products", placements.len());
        Ok(placements)
    }

    /// Reads a product from the bucket the directory names.
    ///
    /// Never places a key: an unassigned key is `NotFound`. A directory entry
    /// without a row is reported as `Inconsistency`.
    pub async fn get_product(&self, key: ProductId) -> Result<Product> {
        let bucket = self
            .directory
            .get_bucket(key)
            .await?
            .ok_or(RouterError::NotFound { key })?;

        let row = match self.store.fetch(bucket.table(), key.0).await? {
            Some(row) => row,
            None => {
                tracing::warn!(
                    "Directory maps product {} to {} but {} has no row",
                    key,
                    bucket,
                    bucket.table()
                );
                return Err(RouterError::Inconsistency { key, bucket });
            }
        };

        let row: ProductRow = serde_json::from_value(Value::Object(row)).map_err(|e| {
            StorageError::Serialization(format!("malformed row in {}: {}", bucket.table(), e))
        })?;
        Ok(Product::from_row(row, bucket))
    }

    /// Row count of every bucket table.
    ///
    /// Each count is its own read; under concurrent writes the numbers are an
    /// approximation and may briefly disagree with the directory.
    pub async fn count_by_bucket(&self) -> Result<BucketCounts> {
        let mut counts = BucketCounts::new();
        for bucket in Bucket::ALL {
            counts.insert(bucket, self.store.count(bucket.table()).await?);
        }
        Ok(counts)
    }

    /// Empties the directory and every bucket table.
    pub async fn truncate(&self) -> Result<()> {
        let mut operations = vec![Directory::truncate_op()];
        operations.extend(Bucket::ALL.iter().map(|bucket| Operation::Truncate {
            table: bucket.table().to_string(),
        }));

        self.store.apply(operations).await?;
        tracing::info!("Truncated directory and bucket tables");
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)().trunc_subsecs(0)
    }

    fn plan(
        &self,
        item: &ProductUpsert,
        current: Option<Bucket>,
        default_hot_ratio: HotRatio,
        now: DateTime<Utc>,
    ) -> Result<(Bucket, Vec<Operation>)> {
        let key = item.product_id;
        let bucket = item
            .bucket
            .or(current)
            .unwrap_or_else(|| default_bucket(key, default_hot_ratio));

        let row = ProductRow {
            product_id: key,
            name: item.name.clone(),
            price: item.price,
            updated_at: now,
        };
        let row = match serde_json::to_value(&row) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Row::new(),
            Err(e) => return Err(StorageError::Serialization(e.to_string()).into()),
        };

        let mut operations = vec![Directory::assign_op(key, bucket)];
        operations.extend(
            Bucket::ALL
                .iter()
                .filter(|other| **other != bucket)
                .map(|other| Operation::Delete {
                    table: other.table().to_string(),
                    key: key.0,
                }),
        );
        operations.push(Operation::Upsert {
            table: bucket.table().to_string(),
            row,
        });

        Ok((bucket, operations))
    }
}

/// Rejects products the bucket tables cannot hold and rounds the price to cents.
fn validate(mut item: ProductUpsert) -> Result<ProductUpsert> {
    let name = item.name.trim();
    if name.is_empty() {
        return Err(RouterError::InvalidParameter(format!(
            "product {} needs a name",
            item.product_id
        )));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RouterError::InvalidParameter(format!(
            "product {} name exceeds {} characters",
            item.product_id, MAX_NAME_LEN
        )));
    }

    let price = item.price.round_dp(2);
    if price < Decimal::ZERO || price >= Decimal::from(MAX_PRICE) {
        return Err(RouterError::InvalidParameter(format!(
            "product {} price {} outside [0, {})",
            item.product_id, item.price, MAX_PRICE
        )));
    }

    item.name = name.to_string();
    item.price = price;
    Ok(item)
}
