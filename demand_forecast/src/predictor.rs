//! Next-day forecasts from a loaded bundle
//!
//! A [`Forecaster`] wraps a verified bundle behind an `Arc` and never
//! mutates it, so one instance can be cloned into as many request handlers
//! or threads as needed. Each forecast rebuilds features with the same code
//! the training pipeline used.

use crate::artifacts::{ArtifactStore, ModelBundle};
use crate::classifier::{DemandClassifier, DemandTier, ThresholdPolicy, Trend};
use crate::data::{group_by_item, latest_date, quantities_before, ForecastContext, SalesObservation};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureVector, TemporalFeatures};
use crate::models::to_quantity;
use crate::store::ObservationStore;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Forecast for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastResult {
    pub item: String,
    pub predicted_quantity: u32,
    pub tier: DemandTier,
    pub trend: Trend,
    pub recommendation: &'static str,
}

/// An item that could not be forecast, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub item: String,
    pub reason: String,
}

/// Headline numbers for a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub highest_item: String,
    pub highest_quantity: u32,
    pub total_demand: u64,
    pub average_demand: f64,
}

/// Forecasts for every item of one tenant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastBatch {
    pub target_date: NaiveDate,
    /// Highest predicted quantity first; ties by item name
    pub results: Vec<ForecastResult>,
    /// Categorical values that took the fallback code
    pub unknown_categories: usize,
    pub skipped: Vec<SkippedItem>,
}

impl ForecastBatch {
    /// Highest item, total and average demand; `None` for an empty batch
    pub fn summary(&self) -> Option<ForecastSummary> {
        let top = self.results.first()?;
        let total: u64 = self
            .results
            .iter()
            .map(|r| r.predicted_quantity as u64)
            .sum();
        Some(ForecastSummary {
            highest_item: top.item.clone(),
            highest_quantity: top.predicted_quantity,
            total_demand: total,
            average_demand: total as f64 / self.results.len() as f64,
        })
    }

    /// The `n` items with the highest predicted demand
    pub fn top(&self, n: usize) -> &[ForecastResult] {
        &self.results[..n.min(self.results.len())]
    }

    /// Result for one item
    pub fn get(&self, item: &str) -> Option<&ForecastResult> {
        self.results.iter().find(|r| r.item == item)
    }
}

impl fmt::Display for ForecastBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast for {}", self.target_date)?;
        writeln!(
            f,
            "{:<20} {:>8}  {:<7} {:<11} {}",
            "Item", "Quantity", "Tier", "Trend", "Recommendation"
        )?;
        for r in &self.results {
            writeln!(
                f,
                "{:<20} {:>8}  {:<7} {:<11} {}",
                r.item, r.predicted_quantity, r.tier, r.trend, r.recommendation
            )?;
        }
        for s in &self.skipped {
            writeln!(f, "Skipped {}: {}", s.item, s.reason)?;
        }
        Ok(())
    }
}

/// Read-only predictor over a verified bundle
#[derive(Debug, Clone)]
pub struct Forecaster {
    bundle: Arc<ModelBundle>,
    classifier: DemandClassifier,
}

impl Forecaster {
    /// Verify a bundle and wrap it
    pub fn new(bundle: ModelBundle, policy: ThresholdPolicy) -> Result<Self> {
        Self::from_shared(Arc::new(bundle), policy)
    }

    /// Wrap a bundle that is already shared
    pub fn from_shared(bundle: Arc<ModelBundle>, policy: ThresholdPolicy) -> Result<Self> {
        bundle.verify()?;
        Ok(Self {
            bundle,
            classifier: DemandClassifier::new(policy)?,
        })
    }

    /// Load a named bundle from an artifact store
    pub fn from_store<A: ArtifactStore + ?Sized>(
        store: &A,
        name: &str,
        policy: ThresholdPolicy,
    ) -> Result<Self> {
        Self::new(store.load_bundle(name)?, policy)
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn classifier(&self) -> &DemandClassifier {
        &self.classifier
    }

    /// Feature vector for an item on a target date, plus the number of
    /// categorical values that fell back
    pub fn feature_vector(
        &self,
        item: &str,
        history: &[f64],
        context: &ForecastContext,
        target: NaiveDate,
    ) -> (FeatureVector, usize) {
        let (codes, fallbacks) = self.bundle.encoders.encode_logged(item, context);
        let temporal = TemporalFeatures::build(history, target);
        (FeatureVector::new(codes, temporal), fallbacks)
    }

    /// Forecast one item from its quantities before `target`, oldest first.
    /// An empty history is allowed.
    pub fn predict_item(
        &self,
        item: &str,
        history: &[f64],
        context: &ForecastContext,
        target: NaiveDate,
    ) -> Result<ForecastResult> {
        self.forecast_item(item, history, context, target)
            .map(|(result, _)| result)
    }

    fn forecast_item(
        &self,
        item: &str,
        history: &[f64],
        context: &ForecastContext,
        target: NaiveDate,
    ) -> Result<(ForecastResult, usize)> {
        let (features, fallbacks) = self.feature_vector(item, history, context, target);
        let raw = self.bundle.ensemble.predict(&features.to_row())?;
        let predicted_quantity = to_quantity(raw);
        let (tier, recommendation) = self.classifier.classify(predicted_quantity);
        debug!(item, raw, predicted_quantity, "Item forecast");

        Ok((
            ForecastResult {
                item: item.to_string(),
                predicted_quantity,
                tier,
                trend: self.classifier.trend(history),
                recommendation,
            },
            fallbacks,
        ))
    }

    /// Forecast every item in a sales history for the day after its latest
    /// date. An item that fails is reported in `skipped`.
    pub fn forecast(
        &self,
        observations: &[SalesObservation],
        context: &ForecastContext,
    ) -> Result<ForecastBatch> {
        let latest = latest_date(observations).ok_or_else(|| {
            ForecastError::DataError("No sales history to forecast from".to_string())
        })?;
        let target = latest.succ_opt().ok_or_else(|| {
            ForecastError::DataError(format!("No calendar day after {}", latest))
        })?;

        let mut results = Vec::new();
        let mut skipped = Vec::new();
        let mut unknown_categories = 0;

        for (item, group) in group_by_item(observations) {
            let history = quantities_before(group.as_slice(), target);
            match self.forecast_item(item, &history, context, target) {
                Ok((result, fallbacks)) => {
                    unknown_categories += fallbacks;
                    results.push(result);
                }
                Err(e) => {
                    warn!(item, error = %e, "Skipping item");
                    skipped.push(SkippedItem {
                        item: item.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        results.sort_by(|a, b| {
            b.predicted_quantity
                .cmp(&a.predicted_quantity)
                .then_with(|| a.item.cmp(&b.item))
        });
        info!(
            %target,
            items = results.len(),
            skipped = skipped.len(),
            unknown_categories,
            "Forecast finished"
        );

        Ok(ForecastBatch {
            target_date: target,
            results,
            unknown_categories,
            skipped,
        })
    }

    /// Fetch an owner's history from a store and forecast it
    pub fn forecast_for_owner<S: ObservationStore + ?Sized>(
        &self,
        store: &S,
        owner_id: &str,
        context: &ForecastContext,
    ) -> Result<ForecastBatch> {
        let observations = store.fetch_observations(owner_id)?;
        self.forecast(&observations, context)
    }
}
