//! # Demand Math
//!
//! Numeric building blocks for demand forecasting.
//! This crate knows nothing about canteens, items or weather; it works on
//! plain `f64` slices and row-major feature matrices.
//!
//! - Window statistics (lags, rolling mean, rolling standard deviation)
//! - Regression metrics (R², MAE, MSE, RMSE)
//! - Forward-chaining train/test splits
//! - Tree regressors: a single CART tree, a bagging forest and a
//!   gradient-boosting ensemble

use thiserror::Error;

pub mod boosting;
pub mod forest;
pub mod metrics;
pub mod rolling;
pub mod tree;
pub mod validation;

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use tree::{RegressionTree, TreeParams};

/// Errors that can occur in numeric calculations and model fitting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

/// A fitted model mapping a feature row to a continuous value
pub trait Regressor {
    /// Width of the rows the model was fitted on
    fn n_features(&self) -> usize;

    /// Predict without checking the row width
    fn predict_unchecked(&self, row: &[f64]) -> f64;

    /// Predict a single row
    fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features() {
            return Err(MathError::InvalidInput(format!(
                "Row has {} features, model expects {}",
                row.len(),
                self.n_features()
            )));
        }
        Ok(self.predict_unchecked(row))
    }

    /// Predict every row of a matrix
    fn predict_many(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

/// Check that a feature matrix and target vector describe the same samples
/// and that every row has the same width. Returns the row width.
pub(crate) fn check_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    if x.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot fit a model on zero samples".to_string(),
        ));
    }
    if x.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Feature rows ({}) don't match targets ({})",
            x.len(),
            y.len()
        )));
    }

    let width = x[0].len();
    if width == 0 {
        return Err(MathError::InvalidInput(
            "Feature rows must not be empty".to_string(),
        ));
    }
    if let Some(bad) = x.iter().position(|row| row.len() != width) {
        return Err(MathError::InvalidInput(format!(
            "Row {} has {} features, expected {}",
            bad,
            x[bad].len(),
            width
        )));
    }
    if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Training data contains non-finite values".to_string(),
        ));
    }

    Ok(width)
}
