//! Narration memory — what was already said, and where.
//!
//! One instance is shared by every request a process serves. Entries never
//! expire by time: each read evicts the entries that lie at or beyond the
//! caller's radius from the current pose, and returns the rest. All access
//! goes through one async mutex, so an append and a prune from concurrent
//! requests never interleave.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sightline_core::geo::{GeoPoint, Pose, distance_m};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A narration delivered at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationMemoryEntry {
    pub text: String,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub recorded_at: DateTime<Utc>,
}

impl NarrationMemoryEntry {
    fn distance_from(&self, pose: &Pose) -> f64 {
        // Entries are only created from validated poses.
        let origin = GeoPoint {
            lat: self.origin_lat,
            lng: self.origin_lng,
        };
        distance_m(pose.point(), origin)
    }
}

/// Process-wide, distance-pruned store of prior narrations.
///
/// Cloning shares the underlying store.
#[derive(Clone, Default)]
pub struct NarrationMemory {
    entries: Arc<Mutex<Vec<NarrationMemoryEntry>>>,
}

impl NarrationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a narration delivered at `(lat, lng)`.
    pub async fn append(&self, text: impl Into<String>, lat: f64, lng: f64) {
        let entry = NarrationMemoryEntry {
            text: text.into(),
            origin_lat: lat,
            origin_lng: lng,
            recorded_at: Utc::now(),
        };
        self.entries.lock().await.push(entry);
    }

    /// Evict every entry at or beyond `max_distance` meters from `pose` and
    /// return the remaining texts, newline-joined in store order.
    pub async fn collect_and_prune(&self, pose: &Pose, max_distance: f64) -> String {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.distance_from(pose) < max_distance);

        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, kept = entries.len(), "Pruned narration memory");
        }

        entries
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// A copy of the current entries, in store order.
    pub async fn snapshot(&self) -> Vec<NarrationMemoryEntry> {
        self.entries.lock().await.clone()
    }
}

impl std::fmt::Debug for NarrationMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationMemory").finish_non_exhaustive()
    }
}
