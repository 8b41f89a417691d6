//! Least-squares gradient boosting over shallow regression trees

use crate::tree::{RegressionTree, TreeParams};
use crate::{check_training_data, MathError, Regressor, Result};
use serde::{Deserialize, Serialize};

/// Gradient boosting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    /// Number of boosting stages
    pub n_estimators: usize,
    /// Shrinkage applied to each stage
    pub learning_rate: f64,
    /// Maximum depth of each stage tree
    pub max_depth: usize,
    /// Minimum samples before a node may split
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            learning_rate: 0.05,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl BoostingParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }

    /// Check the parameters before fitting
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(MathError::InvalidInput(
                "Boosting needs at least one stage".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(MathError::InvalidInput(
                "Learning rate must be in (0, 1]".to_string(),
            ));
        }
        self.tree_params().validate()
    }
}

/// A fitted gradient boosting ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    params: BoostingParams,
    n_features: usize,
    /// Starting prediction, the target mean
    init: f64,
    stages: Vec<RegressionTree>,
}

impl GradientBoosting {
    /// Fit stages on the residuals of the running prediction
    pub fn fit(params: BoostingParams, x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        params.validate()?;
        let n_features = check_training_data(x, y)?;

        let init = y.iter().sum::<f64>() / y.len() as f64;
        let mut current = vec![init; y.len()];
        let mut stages = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, p)| t - p).collect();
            if residuals.iter().all(|r| r.abs() < 1e-12) {
                break;
            }

            let stage = RegressionTree::fit(params.tree_params(), x, &residuals)?;
            for (pred, row) in current.iter_mut().zip(x) {
                *pred += params.learning_rate * stage.predict_unchecked(row);
            }
            stages.push(stage);
        }

        Ok(Self {
            params,
            n_features,
            init,
            stages,
        })
    }

    /// Parameters the ensemble was fitted with
    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    /// Number of fitted stages (may stop early on a perfect fit)
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl Regressor for GradientBoosting {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_unchecked(&self, row: &[f64]) -> f64 {
        self.stages.iter().fold(self.init, |acc, stage| {
            acc + self.params.learning_rate * stage.predict_unchecked(row)
        })
    }
}
