use crate::error::RouterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a product, the routing key of the directory.
///
/// Its decimal string form is what the default policy hashes, so two processes
/// agree on placement as long as they agree on the number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A physical partition holding a disjoint subset of product rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Hot,
    Cold,
}

impl Bucket {
    /// Every bucket, in the order counts and listings report them.
    pub const ALL: [Bucket; 2] = [Bucket::Hot, Bucket::Cold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Hot => "hot",
            Bucket::Cold => "cold",
        }
    }

    /// Name of the table storing product rows for this bucket.
    pub fn table(&self) -> &'static str {
        match self {
            Bucket::Hot => "product_hot",
            Bucket::Cold => "product_cold",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hot" => Ok(Bucket::Hot),
            "cold" => Ok(Bucket::Cold),
            other => Err(RouterError::InvalidBucket(other.to_string())),
        }
    }
}

/// Target fraction of keys the default policy sends to `hot`.
///
/// Always within `[0,1]`; construct through [`HotRatio::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HotRatio(f64);

impl HotRatio {
    pub fn new(value: f64) -> Result<Self, RouterError> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(RouterError::InvalidParameter(format!(
                "hot ratio must be within [0,1], got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for HotRatio {
    fn default() -> Self {
        Self(0.2)
    }
}

impl TryFrom<f64> for HotRatio {
    type Error = RouterError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
