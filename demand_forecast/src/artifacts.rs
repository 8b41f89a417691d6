//! Artifact bundles: everything inference needs, in one file
//!
//! A bundle holds the fitted ensemble, the five category encoders and the
//! feature schema they were built for. Bundles are encoded with bincode so
//! model parameters come back bit-for-bit and a reloaded bundle predicts
//! exactly what it did before it was saved.

use crate::encoding::EncoderSet;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureSchema, FEATURE_COUNT};
use crate::models::Ensemble;
use crate::training::TrainingReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

/// Version of the bundle layout itself
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// The unit persisted after training and loaded before prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub schema: FeatureSchema,
    pub schema_signature: String,
    pub encoders: EncoderSet,
    pub ensemble: Ensemble,
    pub trained_at: DateTime<Utc>,
    pub report: TrainingReport,
}

impl ModelBundle {
    /// Package freshly fitted components under the current schema
    pub fn new(encoders: EncoderSet, ensemble: Ensemble, report: TrainingReport) -> Self {
        let schema = FeatureSchema::current();
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            schema_signature: schema.signature(),
            schema,
            encoders,
            ensemble,
            trained_at: Utc::now(),
            report,
        }
    }

    /// Check that this bundle can be used by the running feature builder
    pub fn verify(&self) -> Result<()> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(ForecastError::DataError(format!(
                "Unsupported bundle format version {} (expected {})",
                self.format_version, BUNDLE_FORMAT_VERSION
            )));
        }

        let expected = FeatureSchema::current().signature();
        if self.schema_signature != expected || self.schema.signature() != expected {
            return Err(ForecastError::SchemaMismatch {
                expected,
                found: self.schema_signature.clone(),
            });
        }

        match self.ensemble.n_features() {
            Some(FEATURE_COUNT) => {}
            Some(n) => {
                return Err(ForecastError::DataError(format!(
                    "Ensemble expects {} features, schema has {}",
                    n, FEATURE_COUNT
                )))
            }
            None => {
                return Err(ForecastError::DataError(
                    "Ensemble members are empty or disagree on feature width".to_string(),
                ))
            }
        }

        self.encoders.check_integrity()
    }

    /// Encode to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode and verify
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bundle: Self = bincode::deserialize(bytes)?;
        bundle.verify()?;
        Ok(bundle)
    }
}

/// Where bundles are kept between training and prediction
pub trait ArtifactStore {
    /// Persist a bundle under a name, replacing any previous one
    fn save_bundle(&self, name: &str, bundle: &ModelBundle) -> Result<()>;

    /// Load and verify a bundle
    fn load_bundle(&self, name: &str) -> Result<ModelBundle>;
}

/// One bundle file per name inside a directory
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing a bundle name
    pub fn bundle_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.bundle", name))
    }

    /// Write a bundle to an explicit path
    pub fn write_to<P: AsRef<Path>>(path: P, bundle: &ModelBundle) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bundle.to_bytes()?)?;
        info!(path = %path.display(), "Saved model bundle");
        Ok(())
    }

    /// Read and verify a bundle from an explicit path
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<ModelBundle> {
        let path = path.as_ref();
        let bundle = ModelBundle::from_bytes(&fs::read(path)?)?;
        info!(path = %path.display(), trained_at = %bundle.trained_at, "Loaded model bundle");
        Ok(bundle)
    }
}

impl ArtifactStore for FileArtifactStore {
    fn save_bundle(&self, name: &str, bundle: &ModelBundle) -> Result<()> {
        Self::write_to(self.bundle_path(name), bundle)
    }

    fn load_bundle(&self, name: &str) -> Result<ModelBundle> {
        Self::read_from(self.bundle_path(name))
    }
}

/// Encoded bundles held in memory
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    bundles: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under a name without checking them
    pub fn insert_raw(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let mut bundles = self
            .bundles
            .write()
            .map_err(|_| ForecastError::DataError("Artifact store lock poisoned".to_string()))?;
        bundles.insert(name.to_string(), bytes);
        Ok(())
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn save_bundle(&self, name: &str, bundle: &ModelBundle) -> Result<()> {
        self.insert_raw(name, bundle.to_bytes()?)
    }

    fn load_bundle(&self, name: &str) -> Result<ModelBundle> {
        let bundles = self
            .bundles
            .read()
            .map_err(|_| ForecastError::DataError("Artifact store lock poisoned".to_string()))?;
        let bytes = bundles
            .get(name)
            .ok_or_else(|| ForecastError::DataError(format!("No bundle named '{}'", name)))?;
        ModelBundle::from_bytes(bytes)
    }
}
