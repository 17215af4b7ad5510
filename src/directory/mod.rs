//! Directory Module
//!
//! The authoritative product id -> bucket table. Writes are idempotent upserts
//! (last writer wins per key); reads have no side effects. Entries are never
//! removed here, only overwritten by an explicit re-assignment or wiped by the
//! administrative truncate.

pub mod directory;
