//! File-backed reading source.
//!
//! The daemon reads its batch from a JSON file that some other process (a
//! provider bridge, a CGM uploader) keeps up to date. The file is re-read on
//! every fetch, so the next sync always sees the latest contents.

use async_trait::async_trait;
use sgv_client::{GlucoseSource, SourceError};
use sgv_core::mmol_to_mgdl;
use sgv_types::Reading;
use std::path::{Path, PathBuf};

use crate::config::{GlucoseUnit, SourceConfig};

/// Readings from a JSON array on disk.
///
/// Each element is `{"timestamp": ..., "value": ...}` where `timestamp` is
/// an RFC3339 string or epoch milliseconds. An element with any other kind
/// of timestamp is kept, and reconciliation later skips it.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    unit: GlucoseUnit,
}

impl FileSource {
    /// Create a source for the given file and unit.
    pub fn new(path: impl Into<PathBuf>, unit: GlucoseUnit) -> Self {
        Self {
            path: path.into(),
            unit,
        }
    }

    /// Create a source from the `[source]` config section.
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(&config.readings_file, config.unit)
    }

    /// Path of the readings file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl GlucoseSource for FileSource {
    async fn fetch(&self) -> Result<Vec<Reading>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io {
                path: self.path.clone(),
                source: e,
            })?;

        let mut readings: Vec<Reading> = serde_json::from_str(&content)
            .map_err(|e| SourceError::Decode(format!("{}: {}", self.path.display(), e)))?;

        if self.unit == GlucoseUnit::Mmol {
            for reading in &mut readings {
                reading.value = mmol_to_mgdl(reading.value);
            }
        }

        tracing::debug!(
            "Read {} readings from {}",
            readings.len(),
            self.path.display()
        );
        Ok(readings)
    }
}
