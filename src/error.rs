//! Router Error Taxonomy
//!
//! Parameter errors (`InvalidBucket`, `InvalidParameter`) are raised at the API
//! boundary before any side effect. Storage failures are never retried here;
//! they travel up as `StorageUnavailable` and the caller decides what to do.

use crate::placement::types::{Bucket, ProductId};
use crate::storage::client::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    /// Bucket name outside the closed `hot`/`cold` set.
    #[error("Unsupported bucket \"{0}\"")]
    InvalidBucket(String),

    /// Parameter outside its allowed domain (e.g. a hot ratio outside `[0,1]`).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The key has no directory entry.
    #[error("Product {key} not found")]
    NotFound { key: ProductId },

    /// The directory names a bucket whose table has no row for the key.
    #[error("Product {key} is assigned to bucket {bucket} but missing from its table")]
    Inconsistency { key: ProductId, bucket: Bucket },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, RouterError>;
