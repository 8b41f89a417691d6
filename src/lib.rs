//! # Canteen Forecast
//!
//! `canteen_forecast` bundles the workspace crates behind one dependency.
//!
//! - [`math`]: window statistics, metrics, splits and tree regressors
//! - [`forecast`]: encoders, features, training, bundles and prediction
//!
//! ## Example
//!
//! ```
//! use canteen_forecast::forecast::{DemandTier, ThresholdPolicy};
//!
//! let policy = ThresholdPolicy::default();
//! assert_eq!(policy.tier(79), DemandTier::Low);
//! assert_eq!(policy.tier(150), DemandTier::High);
//! ```

pub use demand_forecast as forecast;
pub use demand_math as math;

pub use demand_forecast::{
    ForecastConfig, ForecastContext, ForecastError, Forecaster, SalesObservation,
    TrainingPipeline,
};
