//! File-based annotation source.
//!
//! Reads either a JSON array of records or JSON-lines (one record per line).
//! Records are loaded once on open and searched in memory; `reload()` picks
//! up edits to the file.
//!
//! Default location: `~/.sightline/annotations.json`

use async_trait::async_trait;
use sightline_core::annotation::{AnnotationRecord, AnnotationSource, NearbyQuery};
use sightline_core::error::AnnotationError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub struct JsonFileAnnotations {
    path: PathBuf,
    records: Arc<RwLock<Vec<AnnotationRecord>>>,
}

impl JsonFileAnnotations {
    /// Open the annotation file. A missing file yields an empty source.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AnnotationError> {
        let path = path.into();
        let records = Self::load_from_disk(&path)?;
        debug!(path = %path.display(), count = records.len(), "Annotation file loaded");
        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, replacing the loaded records.
    pub async fn reload(&self) -> Result<usize, AnnotationError> {
        let records = Self::load_from_disk(&self.path)?;
        let count = records.len();
        *self.records.write().await = records;
        Ok(count)
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    fn load_from_disk(path: &Path) -> Result<Vec<AnnotationRecord>, AnnotationError> {
        if !path.exists() {
            info!("No annotation file found at {}, starting empty", path.display());
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AnnotationError::Unavailable(format!("Failed to read {}: {e}", path.display()))
        })?;

        if content.trim_start().starts_with('[') {
            return serde_json::from_str(&content).map_err(|e| {
                AnnotationError::Invalid(format!("Failed to parse {}: {e}", path.display()))
            });
        }

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<AnnotationRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted annotation line");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl AnnotationSource for JsonFileAnnotations {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn find_nearby(
        &self,
        query: &NearbyQuery,
    ) -> Result<Vec<AnnotationRecord>, AnnotationError> {
        query
            .point
            .validate()
            .map_err(|e| AnnotationError::Invalid(e.to_string()))?;
        let records = self.records.read().await;
        Ok(crate::nearest(&records, query))
    }
}
