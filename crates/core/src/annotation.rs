//! Annotation records — pre-authored, geotagged descriptions — and the trait
//! over the store that serves them.
//!
//! The store itself is an external collaborator. The narration pipeline only
//! asks it for the annotations nearest to a point, already sorted by distance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AnnotationError, GeometryError};
use crate::geo::GeoPoint;

/// A single annotation as stored by the annotation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Store identifier
    pub id: String,

    pub lat: f64,
    pub lng: f64,

    /// Floor the annotation was authored on, if the site has floors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,

    /// Azimuth the author was facing, degrees clockwise from north
    #[serde(alias = "direction")]
    pub azimuth_deg: f64,

    /// Free-form tags; only the priority tags matter to the selector
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// The authored text
    pub description: String,
}

impl AnnotationRecord {
    /// Location of the annotation, validated.
    pub fn point(&self) -> Result<GeoPoint, GeometryError> {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A nearest-neighbour query against the annotation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyQuery {
    /// Search center
    pub point: GeoPoint,

    /// Restrict to one floor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,

    /// Search radius in meters
    pub max_distance: f64,

    /// Maximum number of records to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
}

/// The annotation store.
///
/// Implementations must return records sorted by ascending distance from
/// `query.point`. The selector relies on that order to break ties.
#[async_trait]
pub trait AnnotationSource: Send + Sync {
    /// A human-readable name for this source (e.g., "in_memory", "json_file").
    fn name(&self) -> &str;

    /// Annotations near a point, nearest first.
    async fn find_nearby(
        &self,
        query: &NearbyQuery,
    ) -> std::result::Result<Vec<AnnotationRecord>, AnnotationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_with_direction_alias() {
        let json = r#"{
            "id": "loc-1",
            "lat": 35.6241,
            "lng": 139.7754,
            "direction": 90.0,
            "tags": ["poi", "sign"],
            "description": "ticket gate"
        }"#;
        let record: AnnotationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.azimuth_deg, 90.0);
        assert!(record.has_tag("poi"));
        assert!(record.has_tag("sign"));
        assert!(!record.has_tag("highpriority"));
        assert_eq!(record.floor, None);
    }

    #[test]
    fn missing_tags_default_to_empty() {
        let json = r#"{"id": "x", "lat": 0.0, "lng": 0.0, "azimuth_deg": 0.0, "description": ""}"#;
        let record: AnnotationRecord = serde_json::from_str(json).unwrap();
        assert!(record.tags.is_empty());
    }

    #[test]
    fn invalid_coordinates_surface_as_geometry_error() {
        let record = AnnotationRecord {
            id: "bad".into(),
            lat: f64::NAN,
            lng: 0.0,
            floor: None,
            azimuth_deg: 0.0,
            tags: BTreeSet::new(),
            description: String::new(),
        };
        assert!(record.point().is_err());
    }
}
