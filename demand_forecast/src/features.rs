//! Feature construction shared by training and inference
//!
//! [`TemporalFeatures::build`] is a pure function of an item's prior
//! quantities and a target date. [`FeatureVector::to_row`] is the only place
//! that decides the column order models see, and [`FeatureSchema`] records
//! that order so an artifact bundle built for a different layout is refused
//! at load time.

use crate::encoding::CategoricalCodes;
use chrono::{Datelike, NaiveDate};
use demand_math::rolling::{lag, rolling_mean, rolling_std};
use serde::{Deserialize, Serialize};

/// Bumped whenever feature semantics change without the names changing
pub const FEATURE_BUILDER_VERSION: u32 = 1;

/// Number of columns in a feature row
pub const FEATURE_COUNT: usize = 14;

/// Column names in model order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "weather",
    "exams",
    "region",
    "time_slot",
    "day_of_week",
    "week_of_year",
    "item",
    "lag_1",
    "lag_2",
    "lag_3",
    "lag_7",
    "rolling_avg_3",
    "rolling_avg_7",
    "rolling_std_7",
];

const SHORT_WINDOW: usize = 3;
const LONG_WINDOW: usize = 7;

/// Lag, rolling and calendar features for one item on one target date
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemporalFeatures {
    pub lag_1: f64,
    pub lag_2: f64,
    pub lag_3: f64,
    pub lag_7: f64,
    pub rolling_avg_3: f64,
    pub rolling_avg_7: f64,
    pub rolling_std_7: f64,
    /// Monday = 0
    pub day_of_week: u32,
    /// ISO week number, 1 to 53
    pub week_of_year: u32,
}

impl TemporalFeatures {
    /// Build features from the quantities observed before `target`, oldest
    /// first.
    ///
    /// `lag_k` is the k-th most recent prior quantity and 0 when fewer than k
    /// exist. Rolling statistics use whatever part of the window is
    /// available; the standard deviation is the sample deviation and 0 below
    /// two values. An empty history yields all-zero temporal values.
    pub fn build(history: &[f64], target: NaiveDate) -> Self {
        Self {
            lag_1: lag(history, 1),
            lag_2: lag(history, 2),
            lag_3: lag(history, 3),
            lag_7: lag(history, 7),
            rolling_avg_3: rolling_mean(history, SHORT_WINDOW),
            rolling_avg_7: rolling_mean(history, LONG_WINDOW),
            rolling_std_7: rolling_std(history, LONG_WINDOW),
            day_of_week: target.weekday().num_days_from_monday(),
            week_of_year: target.iso_week().week(),
        }
    }
}

/// The complete model input for one (item, target date) pair
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    pub codes: CategoricalCodes,
    pub temporal: TemporalFeatures,
}

impl FeatureVector {
    /// Combine encoded context with temporal features
    pub fn new(codes: CategoricalCodes, temporal: TemporalFeatures) -> Self {
        Self { codes, temporal }
    }

    /// Values paired with their column names, in model order
    pub fn named_values(&self) -> [(&'static str, f64); FEATURE_COUNT] {
        let c = &self.codes;
        let t = &self.temporal;
        [
            ("weather", c.weather as f64),
            ("exams", c.exams as f64),
            ("region", c.region as f64),
            ("time_slot", c.time_slot as f64),
            ("day_of_week", t.day_of_week as f64),
            ("week_of_year", t.week_of_year as f64),
            ("item", c.item as f64),
            ("lag_1", t.lag_1),
            ("lag_2", t.lag_2),
            ("lag_3", t.lag_3),
            ("lag_7", t.lag_7),
            ("rolling_avg_3", t.rolling_avg_3),
            ("rolling_avg_7", t.rolling_avg_7),
            ("rolling_std_7", t.rolling_std_7),
        ]
    }

    /// The row a model consumes
    pub fn to_row(&self) -> Vec<f64> {
        self.named_values().iter().map(|(_, v)| *v).collect()
    }
}

/// The feature layout a bundle was trained with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub fields: Vec<String>,
}

impl FeatureSchema {
    /// The layout produced by this build
    pub fn current() -> Self {
        Self {
            version: FEATURE_BUILDER_VERSION,
            fields: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// CRC32 over the version and ordered field names, as 8 hex digits
    pub fn signature(&self) -> String {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.version.to_le_bytes());
        for field in &self.fields {
            hasher.update(field.as_bytes());
            hasher.update(&[0]);
        }
        format!("{:08x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_named_values_match_schema_order() {
        let names: Vec<&str> = FeatureVector::default()
            .named_values()
            .iter()
            .map(|(n, _)| *n)
            .collect();
        assert_eq!(names, FEATURE_NAMES.to_vec());
    }

    #[test]
    fn test_calendar_features() {
        // 2024-01-01 is a Monday in ISO week 1
        let f = TemporalFeatures::build(&[], date(2024, 1, 1));
        assert_eq!(f.day_of_week, 0);
        assert_eq!(f.week_of_year, 1);

        // 2021-01-03 is a Sunday that belongs to ISO week 53 of 2020
        let f = TemporalFeatures::build(&[], date(2021, 1, 3));
        assert_eq!(f.day_of_week, 6);
        assert_eq!(f.week_of_year, 53);
    }

    #[test]
    fn test_lags_and_windows() {
        let history: Vec<f64> = (1..=8).map(|v| v as f64 * 10.0).collect();
        let f = TemporalFeatures::build(&history, date(2024, 5, 1));
        assert_eq!(f.lag_1, 80.0);
        assert_eq!(f.lag_2, 70.0);
        assert_eq!(f.lag_3, 60.0);
        assert_eq!(f.lag_7, 20.0);
        assert_relative_eq!(f.rolling_avg_3, 70.0);
        assert_relative_eq!(f.rolling_avg_7, 50.0);
        assert!(f.rolling_std_7 > 0.0);
    }

    #[test]
    fn test_row_places_values_by_name() {
        let codes = CategoricalCodes {
            weather: 1,
            exams: 2,
            region: 0,
            time_slot: 3,
            item: 4,
        };
        let temporal = TemporalFeatures::build(&[5.0, 6.0], date(2024, 1, 3));
        let row = FeatureVector::new(codes, temporal).to_row();
        assert_eq!(row.len(), FEATURE_COUNT);
        assert_eq!(row[0], 1.0);
        assert_eq!(row[3], 3.0);
        assert_eq!(row[4], 2.0); // Wednesday
        assert_eq!(row[6], 4.0);
        assert_eq!(row[7], 6.0);
        assert_eq!(row[8], 5.0);
        assert_eq!(row[10], 0.0);
    }

    #[test]
    fn test_signature_tracks_order_and_version() {
        let current = FeatureSchema::current();
        assert_eq!(current.signature(), FeatureSchema::current().signature());

        let mut swapped = current.clone();
        swapped.fields.swap(7, 8);
        assert_ne!(current.signature(), swapped.signature());

        let mut bumped = current.clone();
        bumped.version += 1;
        assert_ne!(current.signature(), bumped.signature());
    }
}
