//! Demo Module
//!
//! Fills the directory with generated products and reports where they landed.
//!
//! ## Flow
//! 1. Optionally truncate the directory and bucket tables (a failure only warns).
//! 2. Generate products `1..=N` in one atomic batch, placed by the default policy.
//! 3. Report the first directory rows by key, the bucket counts, and the first
//!    rows by bucket. A failing section is reported and the rest still runs.


use crate::directory::directory::{DirectoryEntry, EntryOrder};
use crate::error::Result;
use crate::placement::types::{HotRatio, ProductId};
use crate::router::router::Router;
use crate::router::types::{BucketCounts, ProductUpsert};

use rand::Rng;
use rust_decimal::Decimal;
use std::fmt::Write;

/// Rows shown per directory listing.
pub const REPORT_ROWS: usize = 20;

const MIN_PRICE_CENTS: i64 = 100;
const MAX_PRICE_CENTS: i64 = 10_000;

/// Products `1..=count` named `Product-NNN` with prices in `1.00..=100.00`.
pub fn sample_products(count: u32, rng: &mut impl Rng) -> Vec<ProductUpsert> {
    (1..=i64::from(count))
        .map(|id| ProductUpsert {
            product_id: ProductId(id),
            name: format!("Product-{:03}", id),
            price: Decimal::new(rng.gen_range(MIN_PRICE_CENTS..=MAX_PRICE_CENTS), 2),
            bucket: None,
        })
        .collect()
}

/// Writes `count` sample products in a single batch and returns their placement.
pub async fn generate_products(
    router: &Router,
    count: u32,
    hot_ratio: HotRatio,
    rng: &mut impl Rng,
) -> Result<Vec<DirectoryEntry>> {
    let items = sample_products(count, rng);
    let placements = router.upsert_batch(items, hot_ratio).await?;
    tracing::info!(
        "Generated {} products with hot ratio {}",
        placements.len(),
        hot_ratio.value()
    );
    Ok(placements)
}

/// Result of one demo run. Each section keeps its own outcome.
#[derive(Debug)]
pub struct DemoReport {
    pub generated: usize,
    pub by_key: Result<Vec<DirectoryEntry>>,
    pub counts: Result<BucketCounts>,
    pub by_bucket: Result<Vec<DirectoryEntry>>,
}

/// Truncates (if asked), generates and collects the report sections.
///
/// Only a failed generation aborts the run.
pub async fn run(
    router: &Router,
    count: u32,
    hot_ratio: HotRatio,
    truncate: bool,
    rng: &mut impl Rng,
) -> Result<DemoReport> {
    if truncate && let Err(e) = router.truncate().await {
        tracing::warn!("Could not truncate tables, continuing: {}", e);
    }

    let placements = generate_products(router, count, hot_ratio, rng).await?;

    let directory = router.directory();
    Ok(DemoReport {
        generated: placements.len(),
        by_key: directory.entries(EntryOrder::Key, REPORT_ROWS).await,
        counts: router.count_by_bucket().await,
        by_bucket: directory.entries(EntryOrder::Bucket, REPORT_ROWS).await,
    })
}

impl DemoReport {
    /// Plain-text tables for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Generated {} products", self.generated);

        let _ = writeln!(out, "\nDirectory (first {} by product_id)", REPORT_ROWS);
        render_entries(&mut out, &self.by_key);

        let _ = writeln!(out, "\nRows per bucket");
        match &self.counts {
            Ok(counts) => {
                let _ = writeln!(out, "{:<8} {:>8}", "bucket", "rows");
                for (bucket, rows) in counts {
                    let _ = writeln!(out, "{:<8} {:>8}", bucket.as_str(), rows);
                }
            }
            Err(e) => {
                let _ = writeln!(out, "error: {}", e);
            }
        }

        let _ = writeln!(out, "\nDirectory (first {} by bucket, product_id)", REPORT_ROWS);
        render_entries(&mut out, &self.by_bucket);
        out
    }
}

fn render_entries(out: &mut String, entries: &Result<Vec<DirectoryEntry>>) {
    match entries {
        Ok(entries) => {
            let _ = writeln!(out, "{:>10}  {}", "product_id", "bucket");
            for entry in entries {
                let _ = writeln!(out, "{:>10}  {}", entry.product_id.0, entry.bucket);
            }
        }
        Err(e) => {
            let _ = writeln!(out, "error: {}", e);
        }
    }
}
