//! Ensemble of independently fitted regressors
//!
//! The ensemble is a list of members plus a combining rule. The default
//! setup is a random forest and a gradient-boosting model averaged with
//! equal weight; adding a member or swapping the combiner does not touch
//! the predictor.

use crate::error::{ForecastError, Result};
use demand_math::{
    BoostingParams, ForestParams, GradientBoosting, RandomForest, Regressor,
};
use serde::{Deserialize, Serialize};

/// What to fit for one ensemble member
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MemberSpec {
    /// Bagging ensemble of deep trees
    RandomForest(ForestParams),
    /// Boosted shallow trees
    GradientBoosting(BoostingParams),
}

impl MemberSpec {
    /// Short display name
    pub fn name(&self) -> &'static str {
        match self {
            MemberSpec::RandomForest(_) => "random_forest",
            MemberSpec::GradientBoosting(_) => "gradient_boosting",
        }
    }

    /// Fit this member on a feature matrix
    pub fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<FittedMember> {
        Ok(match self {
            MemberSpec::RandomForest(params) => {
                FittedMember::RandomForest(RandomForest::fit(*params, x, y)?)
            }
            MemberSpec::GradientBoosting(params) => {
                FittedMember::GradientBoosting(GradientBoosting::fit(*params, x, y)?)
            }
        })
    }
}

/// A fitted ensemble member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedMember {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl FittedMember {
    /// Short display name
    pub fn name(&self) -> &'static str {
        match self {
            FittedMember::RandomForest(_) => "random_forest",
            FittedMember::GradientBoosting(_) => "gradient_boosting",
        }
    }

    fn regressor(&self) -> &dyn Regressor {
        match self {
            FittedMember::RandomForest(model) => model,
            FittedMember::GradientBoosting(model) => model,
        }
    }

    /// Width of the rows the member was fitted on
    pub fn n_features(&self) -> usize {
        self.regressor().n_features()
    }

    /// Raw prediction for one row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        Ok(self.regressor().predict(row)?)
    }
}

/// How member outputs are merged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Combiner {
    /// Arithmetic mean
    #[default]
    Mean,
    /// Weighted mean; one non-negative weight per member
    Weighted(Vec<f64>),
}

impl Combiner {
    /// Check the combiner against the number of members
    pub fn validate(&self, members: usize) -> Result<()> {
        if let Combiner::Weighted(weights) = self {
            if weights.len() != members {
                return Err(ForecastError::ConfigError(format!(
                    "{} weights given for {} ensemble members",
                    weights.len(),
                    members
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(ForecastError::ConfigError(
                    "Ensemble weights must be finite and non-negative".to_string(),
                ));
            }
            if weights.iter().sum::<f64>() <= 0.0 {
                return Err(ForecastError::ConfigError(
                    "Ensemble weights must not all be zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Merge member outputs
    pub fn combine(&self, outputs: &[f64]) -> Result<f64> {
        if outputs.is_empty() {
            return Err(ForecastError::ValidationError(
                "No member outputs to combine".to_string(),
            ));
        }
        match self {
            Combiner::Mean => Ok(outputs.iter().sum::<f64>() / outputs.len() as f64),
            Combiner::Weighted(weights) => {
                self.validate(outputs.len())?;
                let total: f64 = weights.iter().sum();
                Ok(outputs.iter().zip(weights).map(|(o, w)| o * w).sum::<f64>() / total)
            }
        }
    }
}

/// The default members: a forest and a boosting model
pub fn default_members(forest: ForestParams, boosting: BoostingParams) -> Vec<MemberSpec> {
    vec![
        MemberSpec::RandomForest(forest),
        MemberSpec::GradientBoosting(boosting),
    ]
}

/// Fitted members sharing one feature layout, plus their combiner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    members: Vec<FittedMember>,
    combiner: Combiner,
}

impl Ensemble {
    /// Fit every member on the same matrix
    pub fn fit(specs: &[MemberSpec], combiner: Combiner, x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        if specs.is_empty() {
            return Err(ForecastError::ConfigError(
                "An ensemble needs at least one member".to_string(),
            ));
        }
        combiner.validate(specs.len())?;
        let members = specs
            .iter()
            .map(|spec| spec.fit(x, y))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { members, combiner })
    }

    /// Fitted members in order
    pub fn members(&self) -> &[FittedMember] {
        &self.members
    }

    /// The combining rule
    pub fn combiner(&self) -> &Combiner {
        &self.combiner
    }

    /// Feature width shared by all members, or `None` if they disagree
    pub fn n_features(&self) -> Option<usize> {
        let first = self.members.first()?.n_features();
        self.members
            .iter()
            .all(|m| m.n_features() == first)
            .then_some(first)
    }

    /// Each member's raw output for one row
    pub fn member_predictions(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.members.iter().map(|m| m.predict(row)).collect()
    }

    /// Combined raw output for one row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        self.combiner.combine(&self.member_predictions(row)?)
    }

    /// Combined raw outputs for many rows
    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Impurity importances from the forest member, if there is one
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        self.members.iter().find_map(|m| match m {
            FittedMember::RandomForest(forest) => Some(forest.feature_importances()),
            FittedMember::GradientBoosting(_) => None,
        })
    }
}

/// Clip a raw prediction to a non-negative whole quantity.
/// Halves round away from zero; non-finite values become 0.
pub fn to_quantity(raw: f64) -> u32 {
    if !raw.is_finite() {
        return 0;
    }
    raw.max(0.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_combiner() {
        assert_relative_eq!(Combiner::Mean.combine(&[10.0, 20.0]).unwrap(), 15.0);
        assert!(Combiner::Mean.combine(&[]).is_err());
    }

    #[test]
    fn test_weighted_combiner() {
        let c = Combiner::Weighted(vec![3.0, 1.0]);
        assert_relative_eq!(c.combine(&[10.0, 20.0]).unwrap(), 12.5);
        assert!(c.combine(&[10.0]).is_err());
        assert!(Combiner::Weighted(vec![0.0, 0.0]).validate(2).is_err());
        assert!(Combiner::Weighted(vec![-1.0, 2.0]).validate(2).is_err());
    }

    #[test]
    fn test_to_quantity() {
        assert_eq!(to_quantity(-4.2), 0);
        assert_eq!(to_quantity(2.5), 3);
        assert_eq!(to_quantity(2.49), 2);
        assert_eq!(to_quantity(f64::NAN), 0);
        assert_eq!(to_quantity(f64::INFINITY), 0);
    }

    #[test]
    fn test_ensemble_fit_and_predict() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 5.0 } else { 25.0 }).collect();
        let specs = default_members(
            ForestParams {
                n_trees: 10,
                min_samples_leaf: 1,
                ..ForestParams::default()
            },
            BoostingParams {
                n_estimators: 50,
                ..BoostingParams::default()
            },
        );
        let ensemble = Ensemble::fit(&specs, Combiner::Mean, &x, &y).unwrap();
        assert_eq!(ensemble.members().len(), 2);
        assert_eq!(ensemble.n_features(), Some(1));

        let outputs = ensemble.member_predictions(&[15.0]).unwrap();
        let combined = ensemble.predict(&[15.0]).unwrap();
        assert_relative_eq!(combined, (outputs[0] + outputs[1]) / 2.0);
        assert!(ensemble.predict(&[1.0, 2.0]).is_err());
        assert!(ensemble.feature_importances().is_some());
    }

    #[test]
    fn test_empty_ensemble_rejected() {
        let x = vec![vec![1.0]];
        assert!(Ensemble::fit(&[], Combiner::Mean, &x, &[1.0]).is_err());
    }
}
