//! Directory-Based Product Router Library
//!
//! This library crate defines the modules behind the `directory-router` binary (`main.rs`).
//!
//! ## Architecture Modules
//! - **`placement`**: Product ids, buckets, hot ratios and the CRC-32 default placement policy.
//! - **`storage`**: The relational storage client with atomic batches, backed by
//!   an in-memory map or SQLite.
//! - **`directory`**: The persistent product id -> bucket mapping.
//! - **`router`**: Bucket resolution and product reads/writes that keep every
//!   product in exactly the table its directory entry names.
//! - **`api`**: The JSON HTTP surface.
//! - **`demo`**: Sample data generation and placement reporting.
//! - **`config`**: Command line and environment settings.

pub mod api;
pub mod config;
pub mod demo;
pub mod directory;
pub mod error;
pub mod placement;
pub mod router;
pub mod storage;
