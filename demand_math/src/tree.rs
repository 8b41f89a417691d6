//! CART regression tree
//!
//! Greedy binary splits that minimise the squared error of each child.
//! Nodes live in a flat arena so a fitted tree serializes as plain data.

use crate::{check_training_data, MathError, Regressor, Result};
use serde::{Deserialize, Serialize};

/// Growth limits for a regression tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Maximum depth of any leaf (root is depth 0)
    pub max_depth: usize,
    /// Minimum number of samples a node needs before it may split
    pub min_samples_split: usize,
    /// Minimum number of samples in each child of a split
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 8,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl TreeParams {
    /// Check that the limits describe a tree that can be grown
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(MathError::InvalidInput(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(MathError::InvalidInput(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(MathError::InvalidInput(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity_decrease: f64,
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    params: TreeParams,
    n_features: usize,
    nodes: Vec<Node>,
    /// Total squared-error decrease contributed by each feature
    impurity_decrease: Vec<f64>,
}

impl RegressionTree {
    /// Fit a tree on every row of `x`
    pub fn fit(params: TreeParams, x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let indices: Vec<usize> = (0..x.len()).collect();
        Self::fit_indices(params, x, y, indices)
    }

    /// Fit a tree on the rows named by `indices`. Indices may repeat, which
    /// is how bootstrap samples are expressed.
    pub fn fit_indices(
        params: TreeParams,
        x: &[Vec<f64>],
        y: &[f64],
        indices: Vec<usize>,
    ) -> Result<Self> {
        params.validate()?;
        let n_features = check_training_data(x, y)?;
        if indices.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot grow a tree from an empty sample".to_string(),
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= x.len()) {
            return Err(MathError::InvalidInput(format!(
                "Sample index {} out of range for {} rows",
                bad,
                x.len()
            )));
        }

        let mut tree = Self {
            params,
            n_features,
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; n_features],
        };
        tree.grow(x, y, indices, 0);
        Ok(tree)
    }

    fn grow(&mut self, x: &[Vec<f64>], y: &[f64], indices: Vec<usize>, depth: usize) -> usize {
        let n = indices.len() as f64;
        let value = indices.iter().map(|&i| y[i]).sum::<f64>() / n;

        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        if let Some(split) = self.best_split(x, y, &indices, depth) {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
                .into_iter()
                .partition(|&i| x[i][split.feature] <= split.threshold);

            self.impurity_decrease[split.feature] += split.impurity_decrease;
            let left = self.grow(x, y, left_rows, depth + 1);
            let right = self.grow(x, y, right_rows, depth + 1);
            self.nodes[node_id] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
        }

        node_id
    }

    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        depth: usize,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf;
        if depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * min_leaf
        {
            return None;
        }

        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;
        if parent_sse <= 1e-12 {
            return None;
        }
        let parent_score = total_sum * total_sum / n as f64;

        let mut best: Option<SplitCandidate> = None;
        let mut best_score = parent_score + 1e-12;
        let mut order = indices.to_vec();

        for feature in 0..self.n_features {
            order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += y[order[pos]];
                let left_n = pos + 1;
                let right_n = n - left_n;
                if left_n < min_leaf {
                    continue;
                }
                if right_n < min_leaf {
                    break;
                }

                let here = x[order[pos]][feature];
                let next = x[order[pos + 1]][feature];
                if here >= next {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let score =
                    left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;
                if score > best_score {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best_score = score;
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        impurity_decrease: score - parent_score,
                    });
                }
            }
        }

        best
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// Impurity-decrease importances normalized to sum to 1.
    /// All zeros when the tree never split.
    pub fn feature_importances(&self) -> Vec<f64> {
        normalize(&self.impurity_decrease)
    }
}

impl Regressor for RegressionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_unchecked(&self, row: &[f64]) -> f64 {
        self.predict_row(row)
    }
}

pub(crate) fn normalize(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total).collect()
}
