//! Property-based tests for feature construction, encoding and labelling

use chrono::{Duration, NaiveDate};
use demand_forecast::classifier::{DemandTier, ThresholdPolicy, Trend};
use demand_forecast::features::TemporalFeatures;
use demand_forecast::models::to_quantity;
use demand_forecast::CategoryEncoder;
use proptest::prelude::*;

fn quantities(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((0u32..400).prop_map(f64::from), 0..max_len)
}

fn target() -> impl Strategy<Value = NaiveDate> {
    (0i64..3000).prop_map(|d| NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(d))
}

proptest! {
    #[test]
    fn rolling_avg_7_is_mean_of_last_seven(history in quantities(40), date in target()) {
        prop_assume!(history.len() >= 7);
        let features = TemporalFeatures::build(&history, date);
        let expected = history[history.len() - 7..].iter().sum::<f64>() / 7.0;
        prop_assert!((features.rolling_avg_7 - expected).abs() < 1e-9);
    }

    #[test]
    fn lags_zero_fill_short_histories(history in quantities(10), date in target()) {
        let f = TemporalFeatures::build(&history, date);
        for (k, value) in [(1, f.lag_1), (2, f.lag_2), (3, f.lag_3), (7, f.lag_7)] {
            if history.len() < k {
                prop_assert_eq!(value, 0.0);
            }
        }
        prop_assert!(f.day_of_week <= 6);
        prop_assert!((1..=53).contains(&f.week_of_year));
    }

    #[test]
    fn features_are_reproducible(history in quantities(20), date in target()) {
        let a = TemporalFeatures::build(&history, date);
        let b = TemporalFeatures::build(&history.clone(), date);
        prop_assert_eq!(a.rolling_std_7.to_bits(), b.rolling_std_7.to_bits());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn unseen_values_encode_like_the_fallback(
        known in prop::collection::btree_set("[A-Za-z]{1,8}", 1..10),
        probe in "[0-9]{1,6}",
    ) {
        let encoder = CategoryEncoder::fit(known.iter()).unwrap();
        prop_assert_eq!(
            encoder.safe_encode(&probe),
            encoder.safe_encode(encoder.fallback_class())
        );
    }

    #[test]
    fn predictions_are_non_negative_integers(raw in -1.0e6..1.0e6_f64) {
        let q = to_quantity(raw);
        prop_assert!(f64::from(q) >= 0.0);
        if raw < 0.5 {
            prop_assert_eq!(q, 0);
        } else {
            prop_assert!((f64::from(q) - raw).abs() <= 0.5);
        }
    }

    #[test]
    fn tiers_partition_the_quantities(low in 1u32..500, width in 1u32..500, q in 0u32..2000) {
        let policy = ThresholdPolicy::new(low, low + width).unwrap();
        let tier = policy.tier(q);
        let expected = if q < low {
            DemandTier::Low
        } else if q < low + width {
            DemandTier::Medium
        } else {
            DemandTier::High
        };
        prop_assert_eq!(tier, expected);
    }

    #[test]
    fn short_histories_are_stable(history in quantities(6)) {
        prop_assert_eq!(Trend::from_history(&history), Trend::Stable);
    }
}
