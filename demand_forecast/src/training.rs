//! Training pipeline
//!
//! Turns a corpus of sales observations into a [`ModelBundle`]:
//!
//! 1. fit one encoder per categorical column over the whole corpus
//! 2. build one feature row per observation from the item's strictly
//!    earlier history
//! 3. order rows by date and score the ensemble with forward-chaining
//!    cross-validation
//! 4. refit every member on all rows and package the result
//!
//! Training is deterministic: the same corpus and configuration always give
//! the same bundle (apart from its timestamp).

use crate::artifacts::ModelBundle;
use crate::config::ForecastConfig;
use crate::data::{distinct_dates, group_by_item, quantities_before, SalesObservation};
use crate::encoding::EncoderSet;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureVector, TemporalFeatures, FEATURE_NAMES};
use crate::models::{Combiner, Ensemble, MemberSpec};
use crate::store::ObservationStore;
use chrono::NaiveDate;
use demand_math::metrics::RegressionScore;
use demand_math::validation::{feasible_splits, forward_chaining_splits};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Feature rows and targets ready for fitting, ordered by date
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainingSet {
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub dates: Vec<NaiveDate>,
}

impl TrainingSet {
    /// Build the feature matrix for a corpus with fitted encoders
    pub fn build(observations: &[SalesObservation], encoders: &EncoderSet) -> Self {
        let mut samples: Vec<(NaiveDate, Vec<f64>, f64)> = Vec::with_capacity(observations.len());
        let mut fallback_rows = 0usize;

        for (item, group) in group_by_item(observations) {
            for obs in &group {
                let history = quantities_before(group.as_slice(), obs.date);
                let temporal = TemporalFeatures::build(&history, obs.date);
                let (codes, fallbacks) = encoders.encode(item, &obs.context());
                if !fallbacks.is_empty() {
                    fallback_rows += 1;
                }
                let row = FeatureVector::new(codes, temporal).to_row();
                samples.push((obs.date, row, obs.quantity as f64));
            }
            debug!(item, rows = group.len(), "Built training rows");
        }
        if fallback_rows > 0 {
            debug!(rows = fallback_rows, "Training rows with missing context");
        }

        // Stable, so same-day rows keep item order
        samples.sort_by_key(|(date, _, _)| *date);

        let mut set = Self::default();
        for (date, row, target) in samples {
            set.dates.push(date);
            set.rows.push(row);
            set.targets.push(target);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Score of one ensemble member on one fold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberScore {
    pub member: String,
    pub score: RegressionScore,
}

/// Scores for one forward-chaining fold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldReport {
    pub fold: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Score of the combined ensemble output
    pub ensemble: RegressionScore,
    pub members: Vec<MemberScore>,
}

/// Importance of one feature in the fitted forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// What happened during training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrainingReport {
    pub rows: usize,
    pub items: usize,
    pub distinct_dates: usize,
    pub folds: Vec<FoldReport>,
    /// Mean ensemble score across folds; `None` when validation was skipped
    pub mean_score: Option<RegressionScore>,
    /// Sorted by descending importance
    pub feature_importances: Vec<FeatureImportance>,
}

impl TrainingReport {
    /// Mean score of one member across folds
    pub fn member_mean(&self, member: &str) -> Option<RegressionScore> {
        let scores: Vec<RegressionScore> = self
            .folds
            .iter()
            .flat_map(|f| f.members.iter())
            .filter(|m| m.member == member)
            .map(|m| m.score)
            .collect();
        RegressionScore::mean(&scores)
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Trained on {} rows ({} items, {} dates)",
            self.rows, self.items, self.distinct_dates
        )?;
        for fold in &self.folds {
            write!(
                f,
                "Fold {}: train {} / test {}  ensemble {}",
                fold.fold, fold.train_rows, fold.test_rows, fold.ensemble
            )?;
            for m in &fold.members {
                write!(f, "  [{} {}]", m.member, m.score)?;
            }
            writeln!(f)?;
        }
        match &self.mean_score {
            Some(score) => writeln!(f, "Average: {}", score)?,
            None => writeln!(f, "Cross-validation skipped")?,
        }
        if !self.feature_importances.is_empty() {
            writeln!(f, "Top features:")?;
            for fi in self.feature_importances.iter().take(5) {
                writeln!(f, "  {:<14} {:.3}", fi.feature, fi.importance)?;
            }
        }
        Ok(())
    }
}

/// Fits encoders and the ensemble from a corpus
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: ForecastConfig,
    members: Vec<MemberSpec>,
}

impl TrainingPipeline {
    /// Create a pipeline with a validated configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let members = config.training.members();
        Ok(Self { config, members })
    }

    /// Replace the ensemble members, for example to add a third model
    pub fn with_members(mut self, members: Vec<MemberSpec>, combiner: Combiner) -> Result<Self> {
        if members.is_empty() {
            return Err(ForecastError::ConfigError(
                "An ensemble needs at least one member".to_string(),
            ));
        }
        combiner.validate(members.len())?;
        self.members = members;
        self.config.combiner = combiner;
        Ok(self)
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Train on a corpus. The bundle carries a copy of the report.
    pub fn train(&self, observations: &[SalesObservation]) -> Result<(ModelBundle, TrainingReport)> {
        if observations.is_empty() {
            return Err(ForecastError::ValidationError(
                "Cannot train on an empty corpus".to_string(),
            ));
        }
        crate::data::validate_batch(observations)?;

        let dates = distinct_dates(observations);
        if dates < 2 {
            warn!(dates, "Corpus spans fewer than two dates; lag features will be empty");
        }
        info!(rows = observations.len(), dates, "Training started");

        let encoders = EncoderSet::fit(observations)?;
        let set = TrainingSet::build(observations, &encoders);
        let folds = self.cross_validate(&set)?;

        let ensemble = Ensemble::fit(
            &self.members,
            self.config.combiner.clone(),
            &set.rows,
            &set.targets,
        )?;

        let mut feature_importances: Vec<FeatureImportance> = ensemble
            .feature_importances()
            .map(|values| {
                FEATURE_NAMES
                    .iter()
                    .zip(values)
                    .map(|(name, importance)| FeatureImportance {
                        feature: name.to_string(),
                        importance,
                    })
                    .collect()
            })
            .unwrap_or_default();
        feature_importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        let report = TrainingReport {
            rows: set.len(),
            items: encoders.column(crate::encoding::CategoricalColumn::Item).len(),
            distinct_dates: dates,
            mean_score: RegressionScore::mean(
                &folds.iter().map(|f| f.ensemble).collect::<Vec<_>>(),
            ),
            folds,
            feature_importances,
        };
        info!(
            rows = report.rows,
            items = report.items,
            folds = report.folds.len(),
            "Training finished"
        );

        let bundle = ModelBundle::new(encoders, ensemble, report.clone());
        Ok((bundle, report))
    }

    /// Train on every observation an owner has recorded
    pub fn train_from_store<S: ObservationStore + ?Sized>(
        &self,
        store: &S,
        owner_id: &str,
    ) -> Result<(ModelBundle, TrainingReport)> {
        let observations = store.fetch_observations(owner_id)?;
        self.train(&observations)
    }

    fn cross_validate(&self, set: &TrainingSet) -> Result<Vec<FoldReport>> {
        let n_splits = feasible_splits(set.len(), self.config.training.cv_splits);
        if n_splits == 0 {
            warn!(rows = set.len(), "Too few rows for cross-validation, skipping");
            return Ok(Vec::new());
        }
        if n_splits < self.config.training.cv_splits {
            warn!(
                requested = self.config.training.cv_splits,
                used = n_splits,
                "Reduced the number of cross-validation folds"
            );
        }

        let mut reports = Vec::with_capacity(n_splits);
        for (i, fold) in forward_chaining_splits(set.len(), n_splits)?
            .into_iter()
            .enumerate()
        {
            let x_train = &set.rows[fold.train.clone()];
            let y_train = &set.targets[fold.train.clone()];
            let x_test = &set.rows[fold.test.clone()];
            let y_test = &set.targets[fold.test.clone()];

            let ensemble = Ensemble::fit(&self.members, self.config.combiner.clone(), x_train, y_train)?;

            let mut per_member: Vec<Vec<f64>> = vec![Vec::with_capacity(x_test.len()); self.members.len()];
            let mut combined = Vec::with_capacity(x_test.len());
            for row in x_test {
                let outputs = ensemble.member_predictions(row)?;
                combined.push(ensemble.combiner().combine(&outputs)?);
                for (column, value) in per_member.iter_mut().zip(outputs) {
                    column.push(value);
                }
            }

            let members = ensemble
                .members()
                .iter()
                .zip(&per_member)
                .map(|(member, predicted)| {
                    Ok(MemberScore {
                        member: member.name().to_string(),
                        score: RegressionScore::evaluate(y_test, predicted)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let report = FoldReport {
                fold: i + 1,
                train_rows: x_train.len(),
                test_rows: x_test.len(),
                ensemble: RegressionScore::evaluate(y_test, &combined)?,
                members,
            };
            info!(
                fold = report.fold,
                r2 = report.ensemble.r2,
                mae = report.ensemble.mae,
                "Cross-validation fold"
            );
            reports.push(report);
        }
        Ok(reports)
    }
}
