//! Sales observations and the categorical context they are tagged with

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

macro_rules! categorical_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $column:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Every value, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The label stored in sales records and fed to the encoder
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ForecastError;

            fn from_str(s: &str) -> Result<Self> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| {
                        ForecastError::DataError(format!("Unknown {} '{}'", $column, trimmed))
                    })
            }
        }
    };
}

categorical_enum! {
    /// Weather on the day of sale
    Weather, "weather" {
        Sunny => "Sunny",
        Rainy => "Rainy",
        Cloudy => "Cloudy",
    }
}

categorical_enum! {
    /// Exam schedule in effect on the day of sale
    ExamPeriod, "exam period" {
        /// No exams running
        NoExams => "None",
        Midterms => "Midterms",
        Finals => "Finals",
    }
}

categorical_enum! {
    /// Canteen location type
    Region, "region" {
        Urban => "Urban",
        Rural => "Rural",
    }
}

categorical_enum! {
    /// Part of the day the sale was recorded in
    TimeSlot, "time slot" {
        Morning => "Morning",
        Afternoon => "Afternoon",
        Evening => "Evening",
        Night => "Night",
    }
}

impl Default for ExamPeriod {
    fn default() -> Self {
        ExamPeriod::NoExams
    }
}

/// Deserialize an optional categorical cell. Blank cells and labels outside
/// the known set become `None`; the encoder then applies its fallback.
fn lenient_label<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok()))
}

/// One recorded sale. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesObservation {
    /// Tenant that owns the record
    pub owner_id: String,
    /// Item name, used as a categorical key
    pub item: String,
    /// Units sold
    pub quantity: u32,
    #[serde(default, deserialize_with = "lenient_label")]
    pub weather: Option<Weather>,
    /// Missing exam periods are read as "no exams"
    #[serde(default, deserialize_with = "lenient_label")]
    pub exams: Option<ExamPeriod>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub region: Option<Region>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub time_slot: Option<TimeSlot>,
    /// Calendar date of the sale
    pub date: NaiveDate,
}

impl SalesObservation {
    /// Create an observation with no context attached
    pub fn new(owner_id: &str, item: &str, quantity: u32, date: NaiveDate) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            item: item.to_string(),
            quantity,
            weather: None,
            exams: None,
            region: None,
            time_slot: None,
            date,
        }
    }

    /// Attach a categorical context
    pub fn with_context(mut self, context: &ForecastContext) -> Self {
        self.weather = context.weather;
        self.exams = context.exams;
        self.region = context.region;
        self.time_slot = context.time_slot;
        self
    }

    /// The categorical context this sale was recorded under
    pub fn context(&self) -> ForecastContext {
        ForecastContext {
            weather: self.weather,
            exams: self.exams,
            region: self.region,
            time_slot: self.time_slot,
        }
    }

    /// Check the fields every stored record must carry
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(ForecastError::ValidationError(format!(
                "Observation for '{}' on {} has no owner",
                self.item, self.date
            )));
        }
        if self.item.trim().is_empty() {
            return Err(ForecastError::ValidationError(format!(
                "Observation on {} has no item name",
                self.date
            )));
        }
        Ok(())
    }
}

/// Categorical conditions for a day. Any field may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastContext {
    pub weather: Option<Weather>,
    pub exams: Option<ExamPeriod>,
    pub region: Option<Region>,
    pub time_slot: Option<TimeSlot>,
}

impl ForecastContext {
    /// A fully specified context
    pub fn new(weather: Weather, exams: ExamPeriod, region: Region, time_slot: TimeSlot) -> Self {
        Self {
            weather: Some(weather),
            exams: Some(exams),
            region: Some(region),
            time_slot: Some(time_slot),
        }
    }
}

/// Validate a batch as a whole. One record missing a required field rejects
/// the batch; missing categorical context does not.
pub fn validate_batch(batch: &[SalesObservation]) -> Result<()> {
    batch.iter().try_for_each(SalesObservation::validate)
}

/// Group observations by item, each group sorted by ascending date.
/// Same-day records keep their input order.
pub fn group_by_item(observations: &[SalesObservation]) -> BTreeMap<&str, Vec<&SalesObservation>> {
    let mut groups: BTreeMap<&str, Vec<&SalesObservation>> = BTreeMap::new();
    for obs in observations {
        groups.entry(obs.item.as_str()).or_default().push(obs);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|obs| obs.date);
    }
    groups
}

/// Quantities recorded strictly before `date`, oldest first.
/// `sorted` must be ordered by ascending date.
pub fn quantities_before(sorted: &[&SalesObservation], date: NaiveDate) -> Vec<f64> {
    let end = sorted.partition_point(|obs| obs.date < date);
    sorted[..end].iter().map(|obs| obs.quantity as f64).collect()
}

/// The latest date in a set of observations
pub fn latest_date(observations: &[SalesObservation]) -> Option<NaiveDate> {
    observations.iter().map(|obs| obs.date).max()
}

/// Number of distinct dates in a set of observations
pub fn distinct_dates(observations: &[SalesObservation]) -> usize {
    let mut dates: Vec<NaiveDate> = observations.iter().map(|obs| obs.date).collect();
    dates.sort_unstable();
    dates.dedup();
    dates.len()
}
