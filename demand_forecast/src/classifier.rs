//! Business labels for predicted quantities
//!
//! A [`ThresholdPolicy`] splits the non-negative quantities into three
//! tiers: `[0, low_below)` is LOW, `[low_below, high_from)` is MEDIUM and
//! `[high_from, ∞)` is HIGH. Trend compares the last three observations
//! with the three before them.

use crate::error::{ForecastError, Result};
use demand_math::rolling::tail;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observations needed before a trend other than Stable is reported
pub const TREND_MIN_OBSERVATIONS: usize = 6;

const TREND_WINDOW: usize = 3;

/// Demand tier of a predicted quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DemandTier {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
}

impl DemandTier {
    /// Upper-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandTier::Low => "LOW",
            DemandTier::Medium => "MEDIUM",
            DemandTier::High => "HIGH",
        }
    }

    /// Stocking advice for the tier
    pub fn recommendation(&self) -> &'static str {
        match self {
            DemandTier::Low => "Reduce Preparation",
            DemandTier::Medium => "Maintain Stock",
            DemandTier::High => "Increase Preparation",
        }
    }
}

impl fmt::Display for DemandTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of recent sales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    /// Compare the mean of the last three quantities with the mean of the
    /// three before them. Fewer than six quantities is always Stable.
    pub fn from_history(quantities: &[f64]) -> Self {
        if quantities.len() < TREND_MIN_OBSERVATIONS {
            return Trend::Stable;
        }
        let n = quantities.len();
        let recent = tail(quantities, TREND_WINDOW);
        let previous = &quantities[n - 2 * TREND_WINDOW..n - TREND_WINDOW];

        let recent_avg = recent.iter().sum::<f64>() / TREND_WINDOW as f64;
        let previous_avg = previous.iter().sum::<f64>() / TREND_WINDOW as f64;

        if recent_avg > previous_avg {
            Trend::Increasing
        } else if recent_avg < previous_avg {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "Increasing",
            Trend::Decreasing => "Decreasing",
            Trend::Stable => "Stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cut points between the demand tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    /// Quantities below this are LOW
    pub low_below: u32,
    /// Quantities at or above this are HIGH
    pub high_from: u32,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            low_below: 80,
            high_from: 150,
        }
    }
}

impl ThresholdPolicy {
    /// Build a policy, rejecting overlapping or empty tiers
    pub fn new(low_below: u32, high_from: u32) -> Result<Self> {
        let policy = Self {
            low_below,
            high_from,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// The older fixed cut points of 50 and 120
    pub fn absolute() -> Self {
        Self {
            low_below: 50,
            high_from: 120,
        }
    }

    /// Every tier must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.low_below == 0 {
            return Err(ForecastError::ConfigError(
                "LOW tier upper bound must be above zero".to_string(),
            ));
        }
        if self.low_below >= self.high_from {
            return Err(ForecastError::ConfigError(format!(
                "LOW bound ({}) must be below HIGH bound ({})",
                self.low_below, self.high_from
            )));
        }
        Ok(())
    }

    /// Tier of a quantity
    pub fn tier(&self, quantity: u32) -> DemandTier {
        if quantity < self.low_below {
            DemandTier::Low
        } else if quantity < self.high_from {
            DemandTier::Medium
        } else {
            DemandTier::High
        }
    }
}

/// Labels predicted quantities with a tier, recommendation and trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemandClassifier {
    policy: ThresholdPolicy,
}

impl DemandClassifier {
    /// Create a classifier for a validated policy
    pub fn new(policy: ThresholdPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Tier and recommendation for a quantity
    pub fn classify(&self, quantity: u32) -> (DemandTier, &'static str) {
        let tier = self.policy.tier(quantity);
        (tier, tier.recommendation())
    }

    /// Trend of an item's quantities, oldest first
    pub fn trend(&self, quantities: &[f64]) -> Trend {
        Trend::from_history(quantities)
    }
}
