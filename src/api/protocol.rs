//! HTTP Protocol
//!
//! Endpoints and Data Transfer Objects of the JSON API served over the router.
//! Bucket names arrive as plain strings so that an unknown name is reported as
//! an invalid bucket rather than a body decoding failure.

use crate::directory::directory::{DirectoryEntry, EntryOrder};
use crate::placement::types::{Bucket, ProductId};
use crate::router::types::{BucketCounts, Product};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Read (GET) or write (PUT) one product.
pub const ENDPOINT_PRODUCT: &str = "/products/:id";
/// List directory entries.
pub const ENDPOINT_DIRECTORY: &str = "/directory";
/// Read (GET) or assign (PUT) the bucket of one product.
pub const ENDPOINT_DIRECTORY_ENTRY: &str = "/directory/:id";
/// Resolve a bucket, persisting the default placement if needed.
pub const ENDPOINT_RESOLVE: &str = "/directory/:id/resolve";
/// Row counts per bucket table.
pub const ENDPOINT_BUCKET_STATS: &str = "/stats/buckets";

/// Default page size of directory listings.
pub const DEFAULT_LIST_LIMIT: usize = 20;

// --- Data Transfer Objects ---

/// Body of `PUT /products/:id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PutProductRequest {
    pub name: String,
    pub price: Decimal,
    /// Explicit bucket; overrides the directory.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Hot ratio for keys that are not in the directory yet.
    #[serde(default)]
    pub hot_ratio: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutProductResponse {
    pub success: bool,
    /// Bucket the product was written to.
    pub bucket: Option<Bucket>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetProductResponse {
    pub product: Option<Product>,
    pub error: Option<String>,
}

/// Body of `PUT /directory/:id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetBucketRequest {
    pub bucket: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BucketResponse {
    pub product_id: ProductId,
    /// `None` when the product is not in the directory.
    pub bucket: Option<Bucket>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub hot_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryParams {
    pub order: Option<EntryOrder>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DirectoryListResponse {
    pub entries: Vec<DirectoryEntry>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BucketCountsResponse {
    pub counts: BucketCounts,
    pub error: Option<String>,
}
