//! # Demand Forecast
//!
//! Next-day, item-level demand forecasting for canteen operators.
//!
//! ## Features
//!
//! - Sales observations tagged with weather, exam period, region and time slot
//! - Frozen categorical encoders with a first-class fallback for unseen values
//! - Lag, rolling-window and calendar features built from strictly earlier history
//! - A random forest and a gradient-boosting model scored with forward-chaining
//!   cross-validation, then averaged
//! - Versioned artifact bundles checked against the feature schema on load
//! - LOW / MEDIUM / HIGH demand tiers with a configurable threshold policy
//! - Observation stores backed by memory or a CSV file
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, NaiveDate};
//! use demand_forecast::{
//!     ExamPeriod, ForecastConfig, ForecastContext, Forecaster, Region, SalesObservation,
//!     TimeSlot, TrainingPipeline, Weather,
//! };
//!
//! # fn main() -> demand_forecast::Result<()> {
//! let context = ForecastContext::new(
//!     Weather::Sunny,
//!     ExamPeriod::NoExams,
//!     Region::Urban,
//!     TimeSlot::Morning,
//! );
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let history: Vec<SalesObservation> = [40, 42, 38, 45, 50, 120, 130, 125, 128, 132]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, qty)| {
//!         SalesObservation::new("canteen-1", "Tea", *qty, start + Duration::days(i as i64))
//!             .with_context(&context)
//!     })
//!     .collect();
//!
//! let mut config = ForecastConfig::default();
//! config.training.forest.n_trees = 25;
//! let (bundle, report) = TrainingPipeline::new(config.clone())?.train(&history)?;
//! println!("{}", report);
//!
//! let forecaster = Forecaster::new(bundle, config.thresholds)?;
//! let batch = forecaster.forecast(&history, &context)?;
//! for result in &batch.results {
//!     println!("{}: {} ({})", result.item, result.predicted_quantity, result.recommendation);
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod data;
pub mod encoding;
pub mod error;
pub mod features;
pub mod insights;
pub mod models;
pub mod predictor;
pub mod store;
pub mod training;

// Re-export commonly used types
pub use crate::artifacts::{ArtifactStore, FileArtifactStore, MemoryArtifactStore, ModelBundle};
pub use crate::classifier::{DemandClassifier, DemandTier, ThresholdPolicy, Trend};
pub use crate::config::{ForecastConfig, TrainingConfig};
pub use crate::data::{ExamPeriod, ForecastContext, Region, SalesObservation, TimeSlot, Weather};
pub use crate::encoding::{CategoricalColumn, CategoryEncoder, EncoderSet};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureSchema, FeatureVector, TemporalFeatures, FEATURE_NAMES};
pub use crate::models::{Combiner, Ensemble, MemberSpec};
pub use crate::predictor::{ForecastBatch, ForecastResult, Forecaster};
pub use crate::store::{CsvObservationStore, MemoryObservationStore, ObservationStore};
pub use crate::training::{TrainingPipeline, TrainingReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
