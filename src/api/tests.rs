//! HTTP API Tests
//!
//! Handlers are called directly with their extractors, so no socket is bound.
//!
//! ## Test Scopes
//! - **Products**: writes report the bucket, reads map router errors to status codes.
//! - **Directory**: assignment validation, lookup, listing order and limits.
//! - **Stats**: counts per bucket table.

#[cfg(test)]
mod tests {
    use crate::api::build_app;
    use crate::api::handlers::*;
    use crate::api::protocol::*;
    use crate::directory::directory::{DIRECTORY_TABLE, EntryOrder};
    use crate::error::RouterError;
    use crate::placement::types::{Bucket, HotRatio, ProductId};
    use crate::router::router::Router;
    use crate::storage::client::StorageClient;
    use crate::storage::memory::MemoryStore;
    use axum::{
        Json,
        extract::{Extension, Path, Query},
        http::StatusCode,
    };
    use rust_decimal::Decimal;
    use std::sync::Arc;

    async fn setup() -> (Arc<MemoryStore>, Arc<Router>) {
        let store = Arc::new(MemoryStore::new());
        let router = Arc::new(Router::new(store.clone()));
        router.bootstrap().await.unwrap();
        (store, router)
    }

    fn put_request(name: &str, bucket: Option<&str>) -> PutProductRequest {
        PutProductRequest {
            name: name.to_string(),
            price: Decimal::new(2500, 2),
            bucket: bucket.map(str::to_string),
            hot_ratio: None,
        }
    }

    async fn put(
        router: &Arc<Router>,
        id: i64,
        req: PutProductRequest,
    ) -> (StatusCode, Json<PutProductResponse>) {
        handle_put_product(
            Extension(router.clone()),
            Extension(HotRatio::default()),
            Path(id),
            Json(req),
        )
        .await
    }

    // ============================================================
    // PRODUCTS
    // ============================================================

    #[tokio::test]
    async fn test_put_then_get_product() {
        let (_, router) = setup().await;

        let (status, Json(resp)) = put(&router, 42, put_request("Widget", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(resp.success);
        assert_eq!(resp.bucket, Some(Bucket::Hot), "42 hashes below 0.2");

        let (status, Json(resp)) = handle_get_product(Extension(router.clone()), Path(42)).await;
        assert_eq!(status, StatusCode::OK);
        let product = resp.product.expect("product body");
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, Decimal::new(2500, 2));
        assert_eq!(product.bucket, Bucket::Hot);
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn test_put_with_explicit_bucket() {
        let (_, router) = setup().await;

        let (status, Json(resp)) = put(&router, 42, put_request("Widget", Some("cold"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.bucket, Some(Bucket::Cold));
    }

    #[tokio::test]
    async fn test_put_rejects_unknown_bucket() {
        let (store, router) = setup().await;

        let (status, Json(resp)) = put(&router, 7, put_request("Widget", Some("warm"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("warm"));
        assert_eq!(store.local_row_count(), 0, "Nothing may be written");
    }

    #[tokio::test]
    async fn test_put_rejects_ratio_out_of_range() {
        let (store, router) = setup().await;

        let mut req = put_request("Widget", None);
        req.hot_ratio = Some(1.5);
        let (status, _) = put(&router, 7, req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(store.local_row_count(), 0);
    }

    #[tokio::test]
    async fn test_put_request_ratio_overrides_default() {
        let (_, router) = setup().await;

        let mut req = put_request("Widget", None);
        req.hot_ratio = Some(1.0);
        let (_, Json(resp)) = put(&router, 1, req).await;

        assert_eq!(resp.bucket, Some(Bucket::Hot));
    }

    #[tokio::test]
    async fn test_put_rejects_empty_name() {
        let (_, router) = setup().await;

        let (status, Json(resp)) = put(&router, 3, put_request("   ", None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn test_get_unknown_product_is_not_found() {
        let (store, router) = setup().await;

        let (status, Json(resp)) = handle_get_product(Extension(router.clone()), Path(999)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(resp.product.is_none());
        assert!(
            store.fetch(DIRECTORY_TABLE, 999).await.unwrap().is_none(),
            "Reads must not place keys"
        );
    }

    #[tokio::test]
    async fn test_get_inconsistent_product_is_conflict() {
        let (store, router) = setup().await;
        put(&router, 42, put_request("Widget", None)).await;
        store.remove_local(Bucket::Hot.table(), 42);

        let (status, Json(resp)) = handle_get_product(Extension(router.clone()), Path(42)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn test_offline_store_is_unavailable() {
        let (store, router) = setup().await;
        store.set_available(false);

        let (status, Json(resp)) = put(&router, 5, put_request("Widget", None)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!resp.success);
    }

    #[test]
    fn test_error_status_mapping() {
        let key = ProductId(1);
        assert_eq!(
            error_status(&RouterError::InvalidBucket("warm".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&RouterError::InvalidParameter("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&RouterError::NotFound { key }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&RouterError::Inconsistency {
                key,
                bucket: Bucket::Hot
            }),
            StatusCode::CONFLICT
        );
    }

    // ============================================================
    // DIRECTORY
    // ============================================================

    #[tokio::test]
    async fn test_set_and_get_bucket() {
        let (_, router) = setup().await;

        let (status, Json(resp)) = handle_set_bucket(
            Extension(router.clone()),
            Path(10),
            Json(SetBucketRequest {
                bucket: "hot".to_string(),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.bucket, Some(Bucket::Hot));

        let (status, Json(resp)) = handle_get_bucket(Extension(router.clone()), Path(10)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.product_id, ProductId(10));
        assert_eq!(resp.bucket, Some(Bucket::Hot));
    }

    #[tokio::test]
    async fn test_set_bucket_rejects_warm() {
        let (store, router) = setup().await;

        let (status, Json(resp)) = handle_set_bucket(
            Extension(router.clone()),
            Path(10),
            Json(SetBucketRequest {
                bucket: "warm".to_string(),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(resp.bucket.is_none());
        assert!(store.fetch(DIRECTORY_TABLE, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_unassigned_bucket() {
        let (_, router) = setup().await;

        let (status, Json(resp)) = handle_get_bucket(Extension(router.clone()), Path(11)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(resp.bucket.is_none());
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn test_resolve_persists_and_is_stable() {
        let (_, router) = setup().await;

        let (status, Json(first)) = handle_resolve_bucket(
            Extension(router.clone()),
            Extension(HotRatio::default()),
            Path(42),
            Query(ResolveParams { hot_ratio: None }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first.bucket, Some(Bucket::Hot));

        // Stored entry wins over a ratio that would now pick cold.
        let (_, Json(second)) = handle_resolve_bucket(
            Extension(router.clone()),
            Extension(HotRatio::default()),
            Path(42),
            Query(ResolveParams {
                hot_ratio: Some(0.0),
            }),
        )
        .await;
        assert_eq!(second.bucket, Some(Bucket::Hot));
    }

    #[tokio::test]
    async fn test_list_directory_orders_and_limits() {
        let (_, router) = setup().await;
        for (id, bucket) in [(3, "hot"), (1, "cold"), (2, "hot"), (4, "cold")] {
            put(&router, id, put_request("Item", Some(bucket))).await;
        }

        let (status, Json(by_key)) = handle_list_directory(
            Extension(router.clone()),
            Query(DirectoryParams {
                order: None,
                limit: None,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let keys: Vec<i64> = by_key.entries.iter().map(|e| e.product_id.0).collect();
        assert_eq!(keys, vec![1, 2, 3, 4]);

        let (_, Json(by_bucket)) = handle_list_directory(
            Extension(router.clone()),
            Query(DirectoryParams {
                order: Some(EntryOrder::Bucket),
                limit: Some(3),
            }),
        )
        .await;
        let keys: Vec<i64> = by_bucket.entries.iter().map(|e| e.product_id.0).collect();
        assert_eq!(keys, vec![1, 4, 2]);
    }

    // ============================================================
    // STATS
    // ============================================================

    #[tokio::test]
    async fn test_bucket_stats() {
        let (_, router) = setup().await;
        put(&router, 1, put_request("A", Some("hot"))).await;
        put(&router, 2, put_request("B", Some("cold"))).await;
        put(&router, 3, put_request("C", Some("cold"))).await;

        let (status, Json(resp)) = handle_bucket_stats(Extension(router.clone())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.counts.get(&Bucket::Hot), Some(&1));
        assert_eq!(resp.counts.get(&Bucket::Cold), Some(&2));
    }

    #[tokio::test]
    async fn test_build_app() {
        let (_, router) = setup().await;
        let _app = build_app(router, HotRatio::default());
    }
}
