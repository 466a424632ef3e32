//! Narration memory and annotation store implementations for Sightline.
//!
//! - [`NarrationMemory`] remembers what was already said near a location.
//! - [`InMemoryAnnotations`] and [`JsonFileAnnotations`] implement
//!   `sightline_core::AnnotationSource`.

pub mod narration;
pub mod in_memory;
pub mod file_backend;

pub use narration::{NarrationMemory, NarrationMemoryEntry};
pub use in_memory::InMemoryAnnotations;
pub use file_backend::JsonFileAnnotations;

use sightline_core::annotation::{AnnotationRecord, NearbyQuery};
use sightline_core::geo::distance_m;
use tracing::warn;

/// Apply a nearby query to a record set: floor filter, radius filter,
/// nearest first, truncated to `max_count`. Records with invalid coordinates
/// are skipped.
///
/// Floor 0 and `max_count` 0 mean "unset": no floor filter, no limit. A
/// floor filter only matches records authored on that floor.
pub(crate) fn nearest(records: &[AnnotationRecord], query: &NearbyQuery) -> Vec<AnnotationRecord> {
    let floor = query.floor.filter(|f| *f != 0);
    let mut hits: Vec<(f64, &AnnotationRecord)> = records
        .iter()
        .filter(|r| floor.is_none() || r.floor == floor)
        .filter_map(|r| match r.point() {
            Ok(point) => Some((distance_m(query.point, point), r)),
            Err(e) => {
                warn!(id = %r.id, error = %e, "Skipping annotation with invalid location");
                None
            }
        })
        .filter(|(d, _)| *d <= query.max_distance)
        .collect();

    // stable: equidistant records keep store order
    hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(limit) = query.max_count.filter(|n| *n > 0) {
        hits.truncate(limit);
    }
    hits.into_iter().map(|(_, r)| r.clone()).collect()
}
