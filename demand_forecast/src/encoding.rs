//! Categorical encoders
//!
//! Each categorical column gets a [`CategoryEncoder`] fitted once on the
//! training corpus. Codes are the rank of the value among the sorted distinct
//! training values, so the same corpus always yields the same codes.
//! Encoders have no mutating methods: once fitted they are frozen.
//!
//! Values never seen during fitting are not an error. [`CategoryEncoder::safe_encode`]
//! maps them to the code of the first known class (code 0), and the
//! resolution is reported as [`Encoding::Fallback`] so callers can count it.

use crate::data::{ForecastContext, SalesObservation};
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// The categorical columns of a sales record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalColumn {
    Weather,
    Exams,
    Region,
    TimeSlot,
    Item,
}

impl CategoricalColumn {
    /// Every categorical column
    pub const ALL: [CategoricalColumn; 5] = [
        CategoricalColumn::Weather,
        CategoricalColumn::Exams,
        CategoricalColumn::Region,
        CategoricalColumn::TimeSlot,
        CategoricalColumn::Item,
    ];

    /// Column name as used in feature names and records
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalColumn::Weather => "weather",
            CategoricalColumn::Exams => "exams",
            CategoricalColumn::Region => "region",
            CategoricalColumn::TimeSlot => "time_slot",
            CategoricalColumn::Item => "item",
        }
    }

    /// The label this column takes for an item under a context.
    /// A missing exam period reads as "None" (no exams).
    pub fn label<'a>(&self, item: &'a str, context: &ForecastContext) -> Option<&'a str> {
        match self {
            CategoricalColumn::Weather => context.weather.map(|w| w.as_str()),
            CategoricalColumn::Exams => Some(context.exams.unwrap_or_default().as_str()),
            CategoricalColumn::Region => context.region.map(|r| r.as_str()),
            CategoricalColumn::TimeSlot => context.time_slot.map(|t| t.as_str()),
            CategoricalColumn::Item => Some(item).filter(|s| !s.trim().is_empty()),
        }
    }

    /// The label this column takes in a stored observation
    pub fn observation_label<'a>(&self, obs: &'a SalesObservation) -> Option<&'a str> {
        self.label(&obs.item, &obs.context())
    }
}

impl fmt::Display for CategoricalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a value was resolved to a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// The value was seen during fitting
    Known(u32),
    /// The value was unseen or missing; the fallback code was used
    Fallback(u32),
}

impl Encoding {
    /// The numeric code regardless of how it was resolved
    pub fn code(&self) -> u32 {
        match self {
            Encoding::Known(code) | Encoding::Fallback(code) => *code,
        }
    }

    /// Whether the fallback policy was applied
    pub fn is_fallback(&self) -> bool {
        matches!(self, Encoding::Fallback(_))
    }
}

/// Maps the values of one categorical column to stable integer codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    /// Sorted distinct values; a value's code is its index
    classes: Vec<String>,
}

impl CategoryEncoder {
    /// Fit on the observed values of a column. Fails when there are none.
    pub fn fit<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        if classes.is_empty() {
            return Err(ForecastError::ValidationError(
                "Cannot fit an encoder without any values".to_string(),
            ));
        }
        Ok(Self {
            classes: classes.into_iter().collect(),
        })
    }

    /// Fitted classes, in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of known classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false for a fitted encoder
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Code of a known value
    pub fn lookup(&self, value: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
            .map(|idx| idx as u32)
    }

    /// Strict encoding: unknown values are an error
    pub fn encode(&self, value: &str) -> Result<u32> {
        self.lookup(value).ok_or_else(|| {
            ForecastError::DataError(format!("Value '{}' was not seen during fitting", value))
        })
    }

    /// The value at a code
    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    /// The class unseen values fall back to
    pub fn fallback_class(&self) -> &str {
        self.classes.first().map_or("", String::as_str)
    }

    /// Code for `value`, or the fallback class's code when it is unknown
    pub fn safe_encode(&self, value: &str) -> u32 {
        self.resolve(Some(value)).code()
    }

    /// Resolve a possibly missing value, reporting whether the fallback applied
    pub fn resolve(&self, value: Option<&str>) -> Encoding {
        match value.and_then(|v| self.lookup(v)) {
            Some(code) => Encoding::Known(code),
            None => Encoding::Fallback(0),
        }
    }

    /// Classes must be non-empty, sorted and distinct for lookups to work
    pub(crate) fn check_integrity(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(ForecastError::DataError("Encoder has no classes".to_string()));
        }
        if self.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ForecastError::DataError(
                "Encoder classes are not sorted and distinct".to_string(),
            ));
        }
        Ok(())
    }
}

/// Codes for every categorical column of one feature row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoricalCodes {
    pub weather: u32,
    pub exams: u32,
    pub region: u32,
    pub time_slot: u32,
    pub item: u32,
}

/// One fitted encoder per categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSet {
    weather: CategoryEncoder,
    exams: CategoryEncoder,
    region: CategoryEncoder,
    time_slot: CategoryEncoder,
    item: CategoryEncoder,
}

impl EncoderSet {
    /// Fit every column over the whole corpus. A column with no values at
    /// all is a missing required column.
    pub fn fit(observations: &[SalesObservation]) -> Result<Self> {
        let fit_column = |column: CategoricalColumn| {
            CategoryEncoder::fit(
                observations
                    .iter()
                    .filter_map(|obs| column.observation_label(obs)),
            )
            .map_err(|_| {
                ForecastError::ValidationError(format!(
                    "Required column '{}' has no values in the training data",
                    column
                ))
            })
        };

        Ok(Self {
            weather: fit_column(CategoricalColumn::Weather)?,
            exams: fit_column(CategoricalColumn::Exams)?,
            region: fit_column(CategoricalColumn::Region)?,
            time_slot: fit_column(CategoricalColumn::TimeSlot)?,
            item: fit_column(CategoricalColumn::Item)?,
        })
    }

    /// The encoder for one column
    pub fn column(&self, column: CategoricalColumn) -> &CategoryEncoder {
        match column {
            CategoricalColumn::Weather => &self.weather,
            CategoricalColumn::Exams => &self.exams,
            CategoricalColumn::Region => &self.region,
            CategoricalColumn::TimeSlot => &self.time_slot,
            CategoricalColumn::Item => &self.item,
        }
    }

    /// Safe-encode a single value of a column
    pub fn safe_encode(&self, column: CategoricalColumn, value: &str) -> u32 {
        self.column(column).safe_encode(value)
    }

    /// Encode an item under a context. Returns the codes and the columns
    /// that fell back to the default class.
    pub fn encode(
        &self,
        item: &str,
        context: &ForecastContext,
    ) -> (CategoricalCodes, Vec<CategoricalColumn>) {
        let mut fallbacks = Vec::new();
        let mut code = |column: CategoricalColumn| {
            let encoding = self.column(column).resolve(column.label(item, context));
            if encoding.is_fallback() {
                fallbacks.push(column);
            }
            encoding.code()
        };

        let codes = CategoricalCodes {
            weather: code(CategoricalColumn::Weather),
            exams: code(CategoricalColumn::Exams),
            region: code(CategoricalColumn::Region),
            time_slot: code(CategoricalColumn::TimeSlot),
            item: code(CategoricalColumn::Item),
        };
        (codes, fallbacks)
    }

    /// Like [`EncoderSet::encode`], logging a warning for every fallback
    pub fn encode_logged(&self, item: &str, context: &ForecastContext) -> (CategoricalCodes, usize) {
        let (codes, fallbacks) = self.encode(item, context);
        for column in &fallbacks {
            warn!(
                item,
                column = column.name(),
                value = column.label(item, context).unwrap_or("<missing>"),
                fallback = self.column(*column).fallback_class(),
                "Unknown category, using fallback"
            );
        }
        (codes, fallbacks.len())
    }

    pub(crate) fn check_integrity(&self) -> Result<()> {
        for column in CategoricalColumn::ALL {
            self.column(column).check_integrity().map_err(|e| {
                ForecastError::DataError(format!("Encoder for '{}': {}", column, e))
            })?;
        }
        Ok(())
    }
}
