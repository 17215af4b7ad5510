//! Router Module
//!
//! Resolves which bucket owns a product and performs reads and writes against
//! the bucket tables, keeping them consistent with the directory.
//!
//! ## Placement priority
//! 1. **Explicit**: a bucket passed by the caller always wins.
//! 2. **Directory**: otherwise the recorded assignment is used.
//! 3. **Default policy**: otherwise the hash policy decides and the decision is persisted.
//!
//! ## Submodules
//! - **`router`**: The `Router` itself.
//! - **`types`**: Product rows, write requests, bucket counts and table schemas.

pub mod router;
pub mod types;
