//! Generation requests and results — the typed contract between the
//! narration pipeline and whichever generation strategy is configured.

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationRecord;
use crate::image::CapturedImage;

/// How much the user wants to hear, and how far the robot still has to go.
///
/// The remaining distance caps the length: there is no point starting a long
/// narration a few meters before arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verbosity {
    /// 0 = shortest, 2 = longest
    #[serde(default, alias = "length_index")]
    pub level: u8,

    /// Remaining distance to the destination in meters
    #[serde(default = "default_distance_to_travel")]
    pub distance_to_travel: f64,
}

fn default_distance_to_travel() -> f64 {
    100.0
}

impl Default for Verbosity {
    fn default() -> Self {
        Self {
            level: 0,
            distance_to_travel: default_distance_to_travel(),
        }
    }
}

impl Verbosity {
    pub const MAX_LEVEL: u8 = 2;

    pub fn new(level: u8, distance_to_travel: f64) -> Self {
        Self {
            level: level.min(Self::MAX_LEVEL),
            distance_to_travel,
        }
    }

    /// Target number of sentences for the narration.
    pub fn sentence_count(&self) -> u32 {
        let level = u32::from(self.level.min(Self::MAX_LEVEL));
        if self.distance_to_travel < 10.0 {
            // never more than one extra sentence this close to arrival
            1 + u32::from(level == 2)
        } else if self.distance_to_travel < 25.0 {
            2 + level
        } else {
            3 + level
        }
    }

    /// Short budgets only name objects and their positions.
    pub fn is_terse(&self) -> bool {
        self.sentence_count() <= 2
    }
}

/// What the narration is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationMode {
    /// Describe the surroundings
    #[default]
    Surroundings,
    /// Explain why the robot stopped; uses the front camera only
    StopReason,
}

/// The decorated annotation text chosen for each narrated sector.
/// Empty strings mean "no annotation in this sector".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorTexts {
    pub front: String,
    pub left: String,
    pub right: String,
}

/// Everything a generation strategy needs to produce one narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Target language for the translated description (e.g. "en", "ja")
    pub language_code: String,

    pub verbosity: Verbosity,

    #[serde(default)]
    pub mode: NarrationMode,

    pub sector_texts: SectorTexts,

    /// Newline-joined narrations recently delivered near this pose
    #[serde(default)]
    pub narration_memory_text: String,

    /// Images in capture order
    #[serde(default)]
    pub images: Vec<CapturedImage>,
}

/// The outcome of a generation. Never a bare null: a failed backend call
/// still yields a value the caller can inspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationResult {
    Success {
        description: String,
        translated_description: String,
        language_code: String,
    },
    Failure {
        reason: String,
    },
}

impl GenerationResult {
    /// Marker prefixed to every failure reason so clients can recognise a
    /// fallback utterance without parsing the reason.
    pub const ERROR_MARKER: &'static str = "[generation-error]";

    /// Build the fallback result for a failed generation.
    pub fn failure(reason: impl std::fmt::Display) -> Self {
        GenerationResult::Failure {
            reason: format!("{} {reason}", Self::ERROR_MARKER),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The spoken description, if the generation succeeded.
    pub fn description(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { description, .. } => Some(description),
            GenerationResult::Failure { .. } => None,
        }
    }
}

/// The narration as exposed to the calling layer. Field names are relied on
/// by clients rendering the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationOutput {
    pub description: String,
    pub translated: String,
    pub lang: String,
    /// Seconds spent in generation
    pub elapsed_time: f64,
    /// Annotations the store returned for this request
    pub locations: Vec<AnnotationRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_count_near_destination() {
        assert_eq!(Verbosity::new(0, 5.0).sentence_count(), 1);
        assert_eq!(Verbosity::new(1, 5.0).sentence_count(), 1);
        assert_eq!(Verbosity::new(2, 5.0).sentence_count(), 2);
    }

    #[test]
    fn sentence_count_mid_and_far() {
        assert_eq!(Verbosity::new(0, 10.0).sentence_count(), 2);
        assert_eq!(Verbosity::new(2, 24.9).sentence_count(), 4);
        assert_eq!(Verbosity::new(0, 25.0).sentence_count(), 3);
        assert_eq!(Verbosity::new(2, 100.0).sentence_count(), 5);
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(Verbosity::new(9, 100.0).level, 2);
    }

    #[test]
    fn terse_budgets() {
        assert!(Verbosity::new(0, 15.0).is_terse());
        assert!(!Verbosity::new(1, 15.0).is_terse());
        assert!(!Verbosity::default().is_terse());
    }

    #[test]
    fn failure_carries_marker() {
        let result = GenerationResult::failure("backend timed out");
        assert!(result.is_failure());
        match result {
            GenerationResult::Failure { reason } => {
                assert!(reason.starts_with(GenerationResult::ERROR_MARKER));
                assert!(reason.contains("backend timed out"));
            }
            other => panic!("Expected Failure, got: {other:?}"),
        }
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let ok = GenerationResult::Success {
            description: "A bench on the left.".into(),
            translated_description: "A bench on the left.".into(),
            language_code: "en".into(),
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(ok.description(), Some("A bench on the left."));
    }

    #[test]
    fn mode_defaults_to_surroundings() {
        assert_eq!(NarrationMode::default(), NarrationMode::Surroundings);
        let mode: NarrationMode = serde_json::from_str("\"stop_reason\"").unwrap();
        assert_eq!(mode, NarrationMode::StopReason);
    }
}
