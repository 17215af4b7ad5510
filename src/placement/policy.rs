use super::types::{Bucket, HotRatio, ProductId};

/// CRC-32 (IEEE) of the key's decimal string.
pub fn key_hash(key: ProductId) -> u32 {
    crc32fast::hash(key.0.to_string().as_bytes())
}

/// Maps the key hash onto `[0,1]` by dividing by `u32::MAX`.
pub fn normalized_hash(key: ProductId) -> f64 {
    key_hash(key) as f64 / u32::MAX as f64
}

/// Deterministic bucket for a key that has no directory entry yet.
///
/// A ratio of 0 always yields `Cold` and a ratio of 1 always yields `Hot`
/// without hashing. In between, the key is `Hot` when its normalized hash is
/// strictly below the ratio.
pub fn default_bucket(key: ProductId, hot_ratio: HotRatio) -> Bucket {
    let ratio = hot_ratio.value();

    if ratio <= 0.0 {
        return Bucket::Cold;
    }
    if ratio >= 1.0 {
        return Bucket::Hot;
    }

    if normalized_hash(key) < ratio {
        Bucket::Hot
    } else {
        Bucket::Cold
    }
}
