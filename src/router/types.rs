use crate::placement::types::{Bucket, ProductId};
use crate::storage::schema::{ColumnDef, ColumnType, TableSchema};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Row counts per bucket table.
pub type BucketCounts = BTreeMap<Bucket, u64>;

/// Source of `updated_at` stamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A product as stored in a bucket table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRow {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// A product read through the router, tagged with the bucket that holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub updated_at: DateTime<Utc>,
    pub bucket: Bucket,
}

impl Product {
    pub fn from_row(row: ProductRow, bucket: Bucket) -> Self {
        Self {
            product_id: row.product_id,
            name: row.name,
            price: row.price,
            updated_at: row.updated_at,
            bucket,
        }
    }
}

/// Input of a product write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductUpsert {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    /// Wins over both the directory and the default policy.
    #[serde(default)]
    pub bucket: Option<Bucket>,
}

/// `product_hot` / `product_cold`: `(product_id PK, name, price, updated_at)`.
pub fn product_schema(bucket: Bucket) -> TableSchema {
    TableSchema {
        name: bucket.table().to_string(),
        columns: vec![
            ColumnDef::new("product_id", ColumnType::Integer).primary_key(),
            ColumnDef::new("name", ColumnType::Text),
            ColumnDef::new("price", ColumnType::Decimal),
            ColumnDef::new("updated_at", ColumnType::Timestamp),
        ],
    }
}
