//! Annotation selection — the nearest priority annotation per sector.
//!
//! Candidates arrive sorted by the store. Each one that carries a priority
//! tag is decorated, classified by its authoring azimuth, measured by its
//! position, and competes for its sector. Back-sector annotations are never
//! narrated.

use serde::{Deserialize, Serialize};
use sightline_core::annotation::AnnotationRecord;
use sightline_core::generation::SectorTexts;
use sightline_core::geo::{Pose, RelativeOffset};
use sightline_core::sector::{Sector, relative_bearing};
use tracing::{debug, warn};

/// Tags that make an annotation eligible for narration.
pub const PRIORITY_TAGS: [&str; 3] = ["sign", "poi", "highpriority"];

pub const SIGN_MARKER: &str = "[Sign in this direction] ";
pub const HIGH_PRIORITY_MARKER: &str = "[Important] ";
pub const POI_MARKER: &str = "[Facility in this direction] ";

/// Decoration for an annotation's tags, by precedence sign > highpriority > poi.
/// `None` when the annotation carries no priority tag.
pub fn decoration(record: &AnnotationRecord) -> Option<&'static str> {
    if record.has_tag("sign") {
        Some(SIGN_MARKER)
    } else if record.has_tag("highpriority") {
        Some(HIGH_PRIORITY_MARKER)
    } else if record.has_tag("poi") {
        Some(POI_MARKER)
    } else {
        None
    }
}

/// Label prepended to the decorated text. Back has none: it is discarded first.
pub fn sector_prefix(sector: Sector) -> &'static str {
    match sector {
        Sector::Front => "Front: ",
        Sector::Left => "Left: ",
        Sector::Right => "Right: ",
        Sector::Back => "",
    }
}

/// An annotation after decoration and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedAnnotation {
    /// Store id; `None` for the empty-sector sentinel
    pub record_id: Option<String>,
    pub sector: Sector,
    /// Relative bearing in radians, `(-π, π]`
    pub relative_bearing: f64,
    pub offset: RelativeOffset,
    /// Sector prefix + decoration + authored description
    pub text: String,
}

impl ProcessedAnnotation {
    /// The placeholder for a sector with no annotation: infinitely far away,
    /// empty text. Any real candidate beats it.
    pub fn sentinel(sector: Sector) -> Self {
        Self {
            record_id: None,
            sector,
            relative_bearing: 0.0,
            offset: RelativeOffset {
                x: 0.0,
                y: 0.0,
                distance: f64::INFINITY,
            },
            text: String::new(),
        }
    }

    pub fn distance(&self) -> f64 {
        self.offset.distance
    }

    pub fn is_sentinel(&self) -> bool {
        self.record_id.is_none()
    }
}

/// At most one annotation per narrated sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSelection {
    pub front: ProcessedAnnotation,
    pub left: ProcessedAnnotation,
    pub right: ProcessedAnnotation,
}

impl Default for SectorSelection {
    fn default() -> Self {
        Self {
            front: ProcessedAnnotation::sentinel(Sector::Front),
            left: ProcessedAnnotation::sentinel(Sector::Left),
            right: ProcessedAnnotation::sentinel(Sector::Right),
        }
    }
}

impl SectorSelection {
    pub fn get(&self, sector: Sector) -> Option<&ProcessedAnnotation> {
        match sector {
            Sector::Front => Some(&self.front),
            Sector::Left => Some(&self.left),
            Sector::Right => Some(&self.right),
            Sector::Back => None,
        }
    }

    fn slot_mut(&mut self, sector: Sector) -> Option<&mut ProcessedAnnotation> {
        match sector {
            Sector::Front => Some(&mut self.front),
            Sector::Left => Some(&mut self.left),
            Sector::Right => Some(&mut self.right),
            Sector::Back => None,
        }
    }

    /// True when no sector holds an annotation.
    pub fn is_empty(&self) -> bool {
        Sector::NARRATED
            .iter()
            .filter_map(|s| self.get(*s))
            .all(ProcessedAnnotation::is_sentinel)
    }

    /// The per-sector texts handed to generation. Empty sectors give "".
    pub fn texts(&self) -> SectorTexts {
        SectorTexts {
            front: self.front.text.clone(),
            left: self.left.text.clone(),
            right: self.right.text.clone(),
        }
    }
}

/// Picks the nearest priority annotation for each narrated sector.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationSelector;

impl AnnotationSelector {
    pub fn new() -> Self {
        Self
    }

    /// Decorate and classify one candidate. `None` when it is not eligible:
    /// no priority tag, malformed location or azimuth, or behind the robot.
    pub fn process(&self, pose: &Pose, record: &AnnotationRecord) -> Option<ProcessedAnnotation> {
        let marker = decoration(record)?;

        let point = match record.point() {
            Ok(point) => point,
            Err(e) => {
                warn!(id = %record.id, error = %e, "Skipping annotation with invalid location");
                return None;
            }
        };
        if !record.azimuth_deg.is_finite() {
            warn!(id = %record.id, "Skipping annotation with non-finite azimuth");
            return None;
        }

        let bearing = relative_bearing(record.azimuth_deg, pose.heading);
        let sector = Sector::from_radians(bearing);
        if sector == Sector::Back {
            return None;
        }

        Some(ProcessedAnnotation {
            record_id: Some(record.id.clone()),
            sector,
            relative_bearing: bearing,
            offset: pose.offset_to(point),
            text: format!("{}{marker}{}", sector_prefix(sector), record.description),
        })
    }

    /// Select the winner of each sector. A candidate replaces the current
    /// winner only when strictly nearer, so equidistant candidates keep the
    /// first one seen.
    pub fn select(&self, pose: &Pose, candidates: &[AnnotationRecord]) -> SectorSelection {
        let mut selection = SectorSelection::default();

        for record in candidates {
            let Some(processed) = self.process(pose, record) else {
                continue;
            };
            if let Some(slot) = selection.slot_mut(processed.sector) {
                if processed.distance() < slot.distance() {
                    *slot = processed;
                }
            }
        }

        debug!(
            front = !selection.front.is_sentinel(),
            left = !selection.left.is_sentinel(),
            right = !selection.right.is_sentinel(),
            candidates = candidates.len(),
            "Annotations selected"
        );
        selection
    }
}
