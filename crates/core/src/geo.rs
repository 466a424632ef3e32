//! Geodetic positions and the tangent-plane transform into robot-relative
//! coordinates.
//!
//! The robot operates on a scale of tens of meters, so an equirectangular
//! approximation around the midpoint latitude is used instead of a full
//! geodesic. It is not valid near the poles.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeometryError> {
        let point = Self { lat, lng };
        point.validate()?;
        Ok(point)
    }

    /// Check that both coordinates are finite and inside their ranges.
    pub fn validate(&self) -> Result<(), GeometryError> {
        check_range("lat", self.lat, -90.0, 90.0)?;
        check_range("lng", self.lng, -180.0, 180.0)
    }
}

/// The robot's position and heading for one request.
///
/// `heading` is in radians, 0 = geodetic north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub lat: f64,
    pub lng: f64,
    #[serde(alias = "rotation")]
    pub heading: f64,
}

impl Pose {
    /// Build a pose, rejecting malformed input before any transform runs.
    pub fn new(lat: f64, lng: f64, heading: f64) -> Result<Self, GeometryError> {
        let pose = Self { lat, lng, heading };
        pose.validate()?;
        Ok(pose)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        self.point().validate()?;
        if !self.heading.is_finite() {
            return Err(GeometryError::NonFinite { field: "heading" });
        }
        Ok(())
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// Offset of `target` in this pose's frame.
    pub fn offset_to(&self, target: GeoPoint) -> RelativeOffset {
        relative_offset(self.point(), target, self.heading)
    }
}

/// A planar offset in meters relative to the robot, plus its length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeOffset {
    pub x: f64,
    pub y: f64,
    pub distance: f64,
}

/// Project `target` onto the tangent plane at `origin` and rotate the result
/// by `-heading`.
pub fn relative_offset(origin: GeoPoint, target: GeoPoint, heading: f64) -> RelativeOffset {
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();
    let lat2 = target.lat.to_radians();
    let lng2 = target.lng.to_radians();

    let d_lat = lat2 - lat1;
    let d_lng = lng2 - lng1;

    let x = EARTH_RADIUS_M * d_lng * ((lat1 + lat2) / 2.0).cos();
    let y = EARTH_RADIUS_M * d_lat;

    let (sin_h, cos_h) = heading.sin_cos();
    let rel_x = x * cos_h + y * sin_h;
    let rel_y = -x * sin_h + y * cos_h;

    RelativeOffset {
        x: rel_x,
        y: rel_y,
        distance: (rel_x * rel_x + rel_y * rel_y).sqrt(),
    }
}

/// Planar distance in meters between two points. Independent of heading.
pub fn distance_m(origin: GeoPoint, target: GeoPoint) -> f64 {
    relative_offset(origin, target, 0.0).distance
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), GeometryError> {
    if !value.is_finite() {
        return Err(GeometryError::NonFinite { field });
    }
    if value < min || value > max {
        return Err(GeometryError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
