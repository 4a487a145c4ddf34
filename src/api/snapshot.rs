//! Provides the bundled static marker snapshot used when realtime endpoints fail.
//!
//! The snapshot is a JSON array of record-shaped objects. A file on disk takes
//! precedence; when it is missing the copy compiled into the binary is used.

use crate::error::Result;
use crate::models::{normalize_records, LocationRecord};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Default on-disk location of the snapshot.
pub const DEFAULT_SNAPSHOT_PATH: &str = "static/data/marker_data.json";

const BUNDLED_SNAPSHOT: &str = include_str!("../../static/data/marker_data.json");

/// Reads the static fallback snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads and normalizes every record in the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file exists but cannot be read, and
    /// `AppError::JsonParse`/`AppError::DataShape` if its content is unusable.
    pub fn load(&self) -> Result<Vec<LocationRecord>> {
        let raw = if self.path.exists() {
            debug!("Reading static snapshot from {}", self.path.display());
            std::fs::read_to_string(&self.path)?
        } else {
            warn!(
                "Snapshot {} not found; using the bundled copy",
                self.path.display()
            );
            BUNDLED_SNAPSHOT.to_string()
        };
        let payload: Value = serde_json::from_str(&raw)?;
        let records = normalize_records(&payload)?;
        info!("Loaded {} record(s) from static snapshot", records.len());
        Ok(records)
    }

    /// Loads the snapshot restricted to one country (exact match).
    pub fn load_for_country(&self, country: &str) -> Result<Vec<LocationRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|record| record.country == country)
            .collect())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_PATH)
    }
}
