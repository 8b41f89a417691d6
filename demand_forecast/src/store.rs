//! Persistence for sales observations
//!
//! The forecasting code only sees the [`ObservationStore`] trait. Two
//! adapters ship with the crate: an in-memory store and a CSV file store.

use crate::data::{validate_batch, SalesObservation};
use crate::error::Result;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where sales observations are read from and appended to
pub trait ObservationStore {
    /// Every observation recorded for one owner
    fn fetch_observations(&self, owner_id: &str) -> Result<Vec<SalesObservation>>;

    /// Every observation, regardless of owner
    fn fetch_all(&self) -> Result<Vec<SalesObservation>>;

    /// Validate and append a batch. Returns the number of records written.
    /// A batch with one invalid record writes nothing.
    fn insert_observations(&mut self, batch: &[SalesObservation]) -> Result<usize>;
}

/// Observations kept in a vector
#[derive(Debug, Clone, Default)]
pub struct MemoryObservationStore {
    records: Vec<SalesObservation>,
}

impl MemoryObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ObservationStore for MemoryObservationStore {
    fn fetch_observations(&self, owner_id: &str) -> Result<Vec<SalesObservation>> {
        Ok(self
            .records
            .iter()
            .filter(|obs| obs.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn fetch_all(&self) -> Result<Vec<SalesObservation>> {
        Ok(self.records.clone())
    }

    fn insert_observations(&mut self, batch: &[SalesObservation]) -> Result<usize> {
        validate_batch(batch)?;
        self.records.extend_from_slice(batch);
        Ok(batch.len())
    }
}

/// Observations kept in a CSV file with the header
/// `owner_id,item,quantity,weather,exams,region,time_slot,date`
#[derive(Debug, Clone)]
pub struct CsvObservationStore {
    path: PathBuf,
}

impl CsvObservationStore {
    /// Use the file at `path`. It is created on the first insert.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<SalesObservation>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<SalesObservation>, _>>()?;
        debug!(path = %self.path.display(), records = records.len(), "Read observations");
        Ok(records)
    }
}

impl ObservationStore for CsvObservationStore {
    fn fetch_observations(&self, owner_id: &str) -> Result<Vec<SalesObservation>> {
        let mut records = self.read_all()?;
        records.retain(|obs| obs.owner_id == owner_id);
        Ok(records)
    }

    fn fetch_all(&self) -> Result<Vec<SalesObservation>> {
        self.read_all()
    }

    fn insert_observations(&mut self, batch: &[SalesObservation]) -> Result<usize> {
        validate_batch(batch)?;
        if batch.is_empty() {
            return Ok(0);
        }

        let needs_header = match self.path.metadata() {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for obs in batch {
            writer.serialize(obs)?;
        }
        writer.flush()?;
        debug!(path = %self.path.display(), records = batch.len(), "Appended observations");
        Ok(batch.len())
    }
}
