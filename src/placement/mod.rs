//! Placement Module
//!
//! Vocabulary of the router (`ProductId`, `Bucket`, `HotRatio`) and the
//! deterministic hash policy that picks a bucket for keys the directory has
//! never seen.
//!
//! The policy performs no I/O: the same `(key, ratio)` pair yields the same
//! bucket in every process, which keeps demos reproducible and lets other
//! implementations of the same rule agree with this one.

pub mod policy;
pub mod types;

#[cfg(test)]
mod tests;
