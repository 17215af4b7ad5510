use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
};
use std::sync::Arc;

use super::protocol::{
    BucketCountsResponse, BucketResponse, DEFAULT_LIST_LIMIT, DirectoryListResponse,
    DirectoryParams, GetProductResponse, PutProductRequest, PutProductResponse, ResolveParams,
    SetBucketRequest,
};
use crate::error::RouterError;
use crate::placement::types::{Bucket, HotRatio, ProductId};
use crate::router::router::Router;
use crate::router::types::BucketCounts;

/// HTTP status for a router failure.
pub fn error_status(error: &RouterError) -> StatusCode {
    match error {
        RouterError::InvalidBucket(_) | RouterError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        RouterError::NotFound { .. } => StatusCode::NOT_FOUND,
        RouterError::Inconsistency { .. } => StatusCode::CONFLICT,
        RouterError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn log_failure(context: &str, error: &RouterError) {
    match error {
        RouterError::StorageUnavailable(_) | RouterError::Inconsistency { .. } => {
            tracing::error!("{}: {}", context, error)
        }
        _ => tracing::debug!("{}: {}", context, error),
    }
}

/// Request ratio if given, else the server default.
fn effective_ratio(requested: Option<f64>, default: HotRatio) -> Result<HotRatio, RouterError> {
    requested.map(HotRatio::new).transpose().map(|r| r.unwrap_or(default))
}

pub async fn handle_put_product(
    Extension(router): Extension<Arc<Router>>,
    Extension(default_ratio): Extension<HotRatio>,
    Path(id): Path<i64>,
    Json(req): Json<PutProductRequest>,
) -> (StatusCode, Json<PutProductResponse>) {
    let key = ProductId(id);

    let params = effective_ratio(req.hot_ratio, default_ratio).and_then(|ratio| {
        let explicit = req.bucket.as_deref().map(str::parse::<Bucket>).transpose()?;
        Ok((ratio, explicit))
    });

    let result = match params {
        Ok((ratio, explicit)) => {
            router
                .upsert_product(key, &req.name, req.price, explicit, ratio)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(bucket) => (
            StatusCode::OK,
            Json(PutProductResponse {
                success: true,
                bucket: Some(bucket),
                error: None,
            }),
        ),
        Err(e) => {
            log_failure(&format!("Failed to upsert product {}", key), &e);
            (
                error_status(&e),
                Json(PutProductResponse {
                    success: false,
                    bucket: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_get_product(
    Extension(router): Extension<Arc<Router>>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<GetProductResponse>) {
    match router.get_product(ProductId(id)).await {
        Ok(product) => (
            StatusCode::OK,
            Json(GetProductResponse {
                product: Some(product),
                error: None,
            }),
        ),
        Err(e) => {
            log_failure(&format!("Failed to read product {}", id), &e);
            (
                error_status(&e),
                Json(GetProductResponse {
                    product: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_get_bucket(
    Extension(router): Extension<Arc<Router>>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<BucketResponse>) {
    let key = ProductId(id);

    match router.directory().get_bucket(key).await {
        Ok(Some(bucket)) => (
            StatusCode::OK,
            Json(BucketResponse {
                product_id: key,
                bucket: Some(bucket),
                error: None,
            }),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(BucketResponse {
                product_id: key,
                bucket: None,
                error: None,
            }),
        ),
        Err(e) => {
            log_failure(&format!("Failed to read bucket of {}", key), &e);
            (
                error_status(&e),
                Json(BucketResponse {
                    product_id: key,
                    bucket: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_set_bucket(
    Extension(router): Extension<Arc<Router>>,
    Path(id): Path<i64>,
    Json(req): Json<SetBucketRequest>,
) -> (StatusCode, Json<BucketResponse>) {
    let key = ProductId(id);

    let result = match req.bucket.parse::<Bucket>() {
        Ok(bucket) => router
            .directory()
            .set_bucket(key, bucket)
            .await
            .map(|_| bucket),
        Err(e) => Err(e),
    };

    match result {
        Ok(bucket) => {
            tracing::info!("Assigned product {} to {}", key, bucket);
            (
                StatusCode::OK,
                Json(BucketResponse {
                    product_id: key,
                    bucket: Some(bucket),
                    error: None,
                }),
            )
        }
        Err(e) => {
            log_failure(&format!("Failed to assign product {}", key), &e);
            (
                error_status(&e),
                Json(BucketResponse {
                    product_id: key,
                    bucket: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_resolve_bucket(
    Extension(router): Extension<Arc<Router>>,
    Extension(default_ratio): Extension<HotRatio>,
    Path(id): Path<i64>,
    Query(params): Query<ResolveParams>,
) -> (StatusCode, Json<BucketResponse>) {
    let key = ProductId(id);

    let result = match effective_ratio(params.hot_ratio, default_ratio) {
        Ok(ratio) => router.resolve_bucket(key, ratio).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(bucket) => (
            StatusCode::OK,
            Json(BucketResponse {
                product_id: key,
                bucket: Some(bucket),
                error: None,
            }),
        ),
        Err(e) => {
            log_failure(&format!("Failed to resolve product {}", key), &e);
            (
                error_status(&e),
                Json(BucketResponse {
                    product_id: key,
                    bucket: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_list_directory(
    Extension(router): Extension<Arc<Router>>,
    Query(params): Query<DirectoryParams>,
) -> (StatusCode, Json<DirectoryListResponse>) {
    let order = params.order.unwrap_or_default();
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    match router.directory().entries(order, limit).await {
        Ok(entries) => (
            StatusCode::OK,
            Json(DirectoryListResponse {
                entries,
                error: None,
            }),
        ),
        Err(e) => {
            log_failure("Failed to list directory", &e);
            (
                error_status(&e),
                Json(DirectoryListResponse {
                    entries: Vec::new(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn handle_bucket_stats(
    Extension(router): Extension<Arc<Router>>,
) -> (StatusCode, Json<BucketCountsResponse>) {
    match router.count_by_bucket().await {
        Ok(counts) => (
            StatusCode::OK,
            Json(BucketCountsResponse {
                counts,
                error: None,
            }),
        ),
        Err(e) => {
            log_failure("Failed to count buckets", &e);
            (
                error_status(&e),
                Json(BucketCountsResponse {
                    counts: BucketCounts::new(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
