//! HTTP API Module
//!
//! JSON surface over the [`Router`]: product reads and writes, directory
//! inspection and assignment, and bucket statistics.
//!
//! ## Submodules
//! - **`handlers`**: Axum handlers. Every handler answers with a status code and a JSON body.
//! - **`protocol`**: Endpoint paths and request/response types.

pub mod handlers;
pub mod protocol;

#[cfg(test)]
mod tests;

use axum::{
    extract::Extension,
    routing::{get, post},
};
use std::sync::Arc;

use crate::placement::types::HotRatio;
use crate::router::router::Router;
use handlers::*;
use protocol::*;

/// Builds the HTTP application; `default_hot_ratio` places keys whose
/// requests carry no ratio of their own.
pub fn build_app(router: Arc<Router>, default_hot_ratio: HotRatio) -> axum::Router {
    axum::Router::new()
        .route(
            ENDPOINT_PRODUCT,
            get(handle_get_product).put(handle_put_product),
        )
        .route(ENDPOINT_DIRECTORY, get(handle_list_directory))
        .route(
            ENDPOINT_DIRECTORY_ENTRY,
            get(handle_get_bucket).put(handle_set_bucket),
        )
        .route(ENDPOINT_RESOLVE, post(handle_resolve_bucket))
        .route(ENDPOINT_BUCKET_STATS, get(handle_bucket_stats))
        .layer(Extension(router))
        .layer(Extension(default_hot_ratio))
}
