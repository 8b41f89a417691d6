//! Bagging ensemble of regression trees (random forest)
//!
//! Each tree is grown on a bootstrap sample drawn with a per-tree seed, so a
//! forest fitted twice on the same data with the same parameters is identical.

use crate::tree::{normalize, RegressionTree, TreeParams};
use crate::{check_training_data, MathError, Regressor, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Random forest parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples before a node may split
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Base seed for bootstrap sampling
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 400,
            max_depth: 15,
            min_samples_split: 2,
            min_samples_leaf: 3,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }

    /// Check the parameters before fitting
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(MathError::InvalidInput(
                "A forest needs at least one tree".to_string(),
            ));
        }
        self.tree_params().validate()
    }
}

/// A fitted random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fit the forest on all rows
    pub fn fit(params: ForestParams, x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        params.validate()?;
        let n_features = check_training_data(x, y)?;
        let n = x.len();

        let trees = (0..params.n_trees)
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit_indices(params.tree_params(), x, y, sample)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            params,
            n_features,
            trees,
        })
    }

    /// Parameters the forest was fitted with
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Number of fitted trees
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether the forest holds no trees
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Mean of the per-tree normalized importances, renormalized
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, imp) in total.iter_mut().zip(tree.feature_importances()) {
                *acc += imp;
            }
        }
        normalize(&total)
    }
}

impl Regressor for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_unchecked(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_unchecked(row)).sum();
        sum / self.trees.len() as f64
    }
}
