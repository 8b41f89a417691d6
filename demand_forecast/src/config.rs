//! Training and classification settings
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "training": { "cv_splits": 3 }, "thresholds": { "low_below": 50, "high_from": 120 } }
//! ```

use crate::classifier::ThresholdPolicy;
use crate::error::{ForecastError, Result};
use crate::models::{default_members, Combiner, MemberSpec};
use demand_math::{BoostingParams, ForestParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Model fitting and validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Forward-chaining folds used to score the ensemble
    pub cv_splits: usize,
    pub forest: ForestParams,
    pub boosting: BoostingParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            cv_splits: 5,
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
        }
    }
}

impl TrainingConfig {
    /// The ensemble members these settings describe
    pub fn members(&self) -> Vec<MemberSpec> {
        default_members(self.forest, self.boosting)
    }
}

/// Complete forecasting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ForecastConfig {
    pub training: TrainingConfig,
    pub thresholds: ThresholdPolicy,
    pub combiner: Combiner,
}

impl ForecastConfig {
    /// Read a JSON config file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            ForecastError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        if self.training.cv_splits == 0 {
            return Err(ForecastError::ConfigError(
                "cv_splits must be at least 1".to_string(),
            ));
        }
        self.training
            .forest
            .validate()
            .map_err(|e| ForecastError::ConfigError(format!("forest: {}", e)))?;
        self.training
            .boosting
            .validate()
            .map_err(|e| ForecastError::ConfigError(format!("boosting: {}", e)))?;
        self.thresholds.validate()?;
        self.combiner.validate(self.training.members().len())
    }
}
