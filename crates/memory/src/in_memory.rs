//! In-memory annotation source — useful for testing and small fixed sites.

use async_trait::async_trait;
use sightline_core::annotation::{AnnotationRecord, AnnotationSource, NearbyQuery};
use sightline_core::error::AnnotationError;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Annotations held in a Vec, searched linearly.
pub struct InMemoryAnnotations {
    records: Arc<RwLock<Vec<AnnotationRecord>>>,
}

impl InMemoryAnnotations {
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: Vec<AnnotationRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn insert(&self, record: AnnotationRecord) {
        self.records.write().await.push(record);
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryAnnotations {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnnotationSource for InMemoryAnnotations {
    fn name(&self) -> &str {
        "in_memory"
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

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_core::geo::{EARTH_RADIUS_M, GeoPoint};
    use std::collections::BTreeSet;

    const LAT: f64 = 35.6241;
    const LNG: f64 = 139.7754;

    fn record_north(id: &str, meters: f64, floor: Option<i32>) -> AnnotationRecord {
        AnnotationRecord {
            id: id.into(),
            lat: LAT + (meters / EARTH_RADIUS_M).to_degrees(),
            lng: LNG,
            floor,
            azimuth_deg: 0.0,
            tags: BTreeSet::from(["poi".to_string()]),
            description: format!("{id} description"),
        }
    }

    fn query(max_distance: f64, max_count: Option<usize>, floor: Option<i32>) -> NearbyQuery {
        NearbyQuery {
            point: GeoPoint::new(LAT, LNG).unwrap(),
            floor,
            max_distance,
            max_count,
        }
    }

    fn ids(records: &[AnnotationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn nearest_first_within_radius() {
        let store = InMemoryAnnotations::from_records(vec![
            record_north("far", 12.0, None),
            record_north("outside", 40.0, None),
            record_north("near", 3.0, None),
        ]);

        let found = store.find_nearby(&query(15.0, None, None)).await.unwrap();
        assert_eq!(ids(&found), vec!["near", "far"]);
    }

    #[tokio::test]
    async fn max_count_truncates() {
        let store = InMemoryAnnotations::from_records(vec![
            record_north("a", 1.0, None),
            record_north("b", 2.0, None),
            record_north("c", 3.0, None),
        ]);
        let found = store.find_nearby(&query(15.0, Some(2), None)).await.unwrap();
        assert_eq!(ids(&found), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn max_count_zero_means_no_limit() {
        let store = InMemoryAnnotations::from_records(vec![
            record_north("here", 0.0, None),
            record_north("next", 4.0, None),
        ]);
        let found = store.find_nearby(&query(15.0, Some(0), None)).await.unwrap();
        assert_eq!(ids(&found), vec!["here", "next"]);
    }

    #[tokio::test]
    async fn floor_filter_matches_that_floor_only() {
        let store = InMemoryAnnotations::from_records(vec![
            record_north("ground", 1.0, Some(1)),
            record_north("upstairs", 2.0, Some(2)),
            record_north("anywhere", 3.0, None),
        ]);
        let found = store.find_nearby(&query(15.0, None, Some(1))).await.unwrap();
        assert_eq!(ids(&found), vec!["ground"]);
    }

    #[tokio::test]
    async fn floor_zero_disables_the_filter() {
        let store = InMemoryAnnotations::from_records(vec![
            record_north("ground", 1.0, Some(1)),
            record_north("upstairs", 2.0, Some(2)),
            record_north("anywhere", 3.0, None),
        ]);
        let found = store.find_nearby(&query(15.0, None, Some(0))).await.unwrap();
        assert_eq!(ids(&found), vec!["ground", "upstairs", "anywhere"]);
    }

    #[tokio::test]
    async fn invalid_records_are_skipped() {
        let mut broken = record_north("broken", 1.0, None);
        broken.lat = f64::NAN;
        let store = InMemoryAnnotations::from_records(vec![broken, record_north("ok", 2.0, None)]);
        let found = store.find_nearby(&query(15.0, None, None)).await.unwrap();
        assert_eq!(ids(&found), vec!["ok"]);
    }

    #[tokio::test]
    async fn insert_and_count() {
        let store = InMemoryAnnotations::new();
        store.insert(record_north("a", 1.0, None)).await;
        assert_eq!(store.count().await, 1);
        assert_eq!(store.name(), "in_memory");
    }
}
