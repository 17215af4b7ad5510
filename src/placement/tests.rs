//! Placement Module Tests
//!
//! ## Test Scopes
//! - **Policy**: determinism, ratio boundaries and the spread of hot keys.
//! - **Types**: bucket parsing and hot ratio validation.

#[cfg(test)]
mod tests {
    use crate::error::RouterError;
    use crate::placement::policy::{default_bucket, key_hash, normalized_hash};
    use crate::placement::types::{Bucket, HotRatio, ProductId};

    fn ratio(value: f64) -> HotRatio {
        HotRatio::new(value).unwrap()
    }

    // ============================================================
    // POLICY TESTS
    // ============================================================

    #[test]
    fn test_key_hash_is_ieee_crc32_of_decimal_string() {
        // Standard CRC-32 check value
        assert_eq!(key_hash(ProductId(123456789)), 0xCBF4_3926);
    }

    #[test]
    fn test_default_bucket_is_deterministic() {
        let r = ratio(0.2);
        for id in 1..500 {
            let first = default_bucket(ProductId(id), r);
            let second = default_bucket(ProductId(id), r);
            assert_eq!(first, second, "Key {} changed bucket between calls", id);
        }
    }

    #[test]
    fn test_zero_ratio_is_always_cold() {
        for id in -50..500 {
            assert_eq!(default_bucket(ProductId(id), ratio(0.0)), Bucket::Cold);
        }
    }

    #[test]
    fn test_full_ratio_is_always_hot() {
        for id in -50..500 {
            assert_eq!(default_bucket(ProductId(id), ratio(1.0)), Bucket::Hot);
        }
    }

    #[test]
    fn test_known_placements() {
        // crc32("42") / u32::MAX ~= 0.1959
        assert_eq!(default_bucket(ProductId(42), ratio(0.2)), Bucket::Hot);
        assert_eq!(default_bucket(ProductId(42), ratio(0.19)), Bucket::Cold);

        // crc32("1") / u32::MAX ~= 0.5151
        assert_eq!(default_bucket(ProductId(1), ratio(0.2)), Bucket::Cold);
        assert_eq!(default_bucket(ProductId(1), ratio(0.6)), Bucket::Hot);
    }

    #[test]
    fn test_normalized_hash_within_unit_interval() {
        for id in 0..1000 {
            let n = normalized_hash(ProductId(id));
            assert!((0.0..=1.0).contains(&n), "Key {} normalized to {}", id, n);
        }
    }

    #[test]
    fn test_hot_fraction_tracks_ratio() {
        let r = ratio(0.2);
        let hot = (1..=10_000)
            .filter(|id| default_bucket(ProductId(*id), r) == Bucket::Hot)
            .count();

        // Roughly 20% of 10k keys
        assert!(
            (1_500..=2_500).contains(&hot),
            "Expected ~2000 hot keys, got {}",
            hot
        );
    }

    // ============================================================
    // TYPE TESTS
    // ============================================================

    #[test]
    fn test_bucket_parse_roundtrip() {
        for bucket in Bucket::ALL {
            assert_eq!(bucket.as_str().parse::<Bucket>().unwrap(), bucket);
        }
    }

    #[test]
    fn test_bucket_parse_rejects_unknown() {
        let err = "warm".parse::<Bucket>().unwrap_err();
        assert!(matches!(err, RouterError::InvalidBucket(ref b) if b == "warm"));

        // Case sensitive, like the directory CHECK constraint
        assert!("HOT".parse::<Bucket>().is_err());
    }

    #[test]
    fn test_bucket_tables_are_distinct() {
        assert_eq!(Bucket::Hot.table(), "product_hot");
        assert_eq!(Bucket::Cold.table(), "product_cold");
    }

    #[test]
    fn test_hot_ratio_validation() {
        assert!(HotRatio::new(0.0).is_ok());
        assert!(HotRatio::new(1.0).is_ok());
        assert!(HotRatio::new(0.35).is_ok());

        for bad in [-0.01, 1.01, f64::NAN, f64::INFINITY] {
            let err = HotRatio::new(bad).unwrap_err();
            assert!(
                matches!(err, RouterError::InvalidParameter(_)),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_bucket_serializes_lowercase() {
        let json = serde_json::to_string(&Bucket::Hot).unwrap();
        assert_eq!(json, "\"hot\"");

        let parsed: Bucket = serde_json::from_str("\"cold\"").unwrap();
        assert_eq!(parsed, Bucket::Cold);
    }
}
