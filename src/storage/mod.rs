//! Relational Storage Module
//!
//! The storage client the directory and router are built on.
//!
//! ## Core Concepts
//! - **Tables**: Declared up front through `TableSchema`; rows are JSON objects keyed by column.
//! - **Batches**: `StorageClient::apply` is the single write path and is atomic.
//! - **Upsert**: Insert-or-update on the primary key, the primitive that keeps one row per key.
//! - **Backends**: `MemoryStore` (DashMap, used by tests and `--in-memory`) and `SqliteStore` (rusqlite).

pub mod client;
pub mod memory;
pub mod schema;
pub mod sqlite;
