//! Coarse bearing buckets relative to the robot heading.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Half-width of the Front sector, and of the Back sector, in degrees.
pub const FRONT_THRESHOLD_DEG: f64 = 30.0;

/// A coarse bearing bucket relative to the robot heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Front,
    Left,
    Right,
    Back,
}

impl Sector {
    /// The three sectors narrated downstream, in prompt order.
    pub const NARRATED: [Sector; 3] = [Sector::Front, Sector::Left, Sector::Right];

    /// Classify an annotation by its authoring azimuth (degrees) against the
    /// pose heading (radians).
    pub fn classify(azimuth_deg: f64, heading: f64) -> Self {
        Self::from_radians(relative_bearing(azimuth_deg, heading))
    }

    /// Classify a relative bearing already normalized into `(-π, π]`.
    pub fn from_radians(diff: f64) -> Self {
        Self::from_degrees(diff.to_degrees())
    }

    /// Classify a relative bearing in degrees.
    pub fn from_degrees(degrees: f64) -> Self {
        if degrees.abs() < FRONT_THRESHOLD_DEG {
            Sector::Front
        } else if degrees.abs() > 180.0 - FRONT_THRESHOLD_DEG {
            Sector::Back
        } else if degrees > 0.0 {
            Sector::Left
        } else {
            Sector::Right
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Front => "front",
            Sector::Left => "left",
            Sector::Right => "right",
            Sector::Back => "back",
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Sector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(Sector::Front),
            "left" => Ok(Sector::Left),
            "right" => Ok(Sector::Right),
            "back" => Ok(Sector::Back),
            other => Err(format!("unknown sector '{other}'")),
        }
    }
}

/// `-azimuth - heading`, normalized into `(-π, π]`.
///
/// Azimuths are authored clockwise from north while headings turn the other
/// way, hence the negation.
pub fn relative_bearing(azimuth_deg: f64, heading: f64) -> f64 {
    normalize_angle(-azimuth_deg * PI / 180.0 - heading)
}

/// Wrap an angle into `(-π, π]` by whole turns.
pub fn normalize_angle(mut angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    while angle <= -PI {
        angle += TAU;
    }
    while angle > PI {
        angle -= TAU;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn front_boundary_is_exclusive() {
        assert_eq!(Sector::from_degrees(29.999), Sector::Front);
        assert_ne!(Sector::from_degrees(30.0), Sector::Front);
        assert_eq!(Sector::from_degrees(30.0), Sector::Left);
        assert_eq!(Sector::from_degrees(-30.0), Sector::Right);
    }

    #[test]
    fn back_boundary_is_exclusive() {
        assert_ne!(Sector::from_degrees(150.0), Sector::Back);
        assert_eq!(Sector::from_degrees(150.0), Sector::Left);
        assert_eq!(Sector::from_degrees(150.001), Sector::Back);
        assert_eq!(Sector::from_degrees(-150.001), Sector::Back);
        assert_eq!(Sector::from_degrees(180.0), Sector::Back);
    }

    #[test]
    fn positive_is_left_negative_is_right() {
        assert_eq!(Sector::from_degrees(90.0), Sector::Left);
        assert_eq!(Sector::from_degrees(-90.0), Sector::Right);
    }

    #[test]
    fn azimuth_zero_at_heading_zero_is_front() {
        assert_eq!(Sector::classify(0.0, 0.0), Sector::Front);
    }

    #[test]
    fn azimuth_negation_convention() {
        // An annotation authored facing 90° east reads as -90°, i.e. Right.
        assert_eq!(Sector::classify(90.0, 0.0), Sector::Right);
        assert_eq!(Sector::classify(-90.0, 0.0), Sector::Left);
        assert_eq!(Sector::classify(180.0, 0.0), Sector::Back);
    }

    #[test]
    fn heading_shifts_the_bearing() {
        // Facing a quarter turn, an azimuth of -90° lines up with the front.
        assert_eq!(Sector::classify(-90.0, FRAC_PI_2), Sector::Front);
    }

    #[test]
    fn normalize_wraps_multiple_turns() {
        let wrapped = normalize_angle(5.0 * TAU + 0.25);
        assert!((wrapped - 0.25).abs() < 1e-9);
        let wrapped = normalize_angle(-3.0 * TAU - 0.25);
        assert!((wrapped + 0.25).abs() < 1e-9);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn parse_round_trips_display() {
        for sector in [Sector::Front, Sector::Left, Sector::Right, Sector::Back] {
            assert_eq!(sector.to_string().parse::<Sector>().unwrap(), sector);
        }
        assert!("up".parse::<Sector>().is_err());
    }
}
