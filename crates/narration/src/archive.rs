//! Request archive.
//!
//! With `narration.log_dir` set, every request leaves one directory
//! `<log_dir>/<YYYYmmdd-HHMMSS>-<request id>/` holding:
//!
//! - `params.json` — pose and the resolved request parameters
//! - `prompt.json` — the prompt plan the backend built
//! - `locations.json` — annotations the store returned
//! - `response.json` — the generation result and elapsed time
//! - `front.jpg` — the front camera image, when one was sent

use chrono::{DateTime, Utc};
use serde::Serialize;
use sightline_core::annotation::AnnotationRecord;
use sightline_core::generation::{GenerationResult, NarrationMode, Verbosity};
use sightline_core::geo::Pose;
use sightline_core::image::CapturedImage;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::prompt::PromptPlan;

/// Request parameters after defaults were applied.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedParams<'a> {
    #[serde(flatten)]
    pub pose: Pose,
    pub floor: Option<i32>,
    pub max_distance: f64,
    pub max_count: usize,
    pub language: &'a str,
    pub verbosity: Verbosity,
    pub mode: NarrationMode,
    /// Sector tags of the images, in capture order
    pub images: Vec<&'a str>,
}

/// Everything archived for one request.
pub struct ArchivedRequest<'a> {
    pub request_id: Uuid,
    pub params: ArchivedParams<'a>,
    pub prompt: &'a PromptPlan,
    pub locations: &'a [AnnotationRecord],
    pub result: &'a GenerationResult,
    pub elapsed_time: f64,
    pub images: &'a [CapturedImage],
}

#[derive(Serialize)]
struct ArchivedResponse<'a> {
    request_id: Uuid,
    elapsed_time: f64,
    result: &'a GenerationResult,
}

/// Writes request archives under a root directory.
#[derive(Debug, Clone)]
pub struct RequestArchive {
    root: PathBuf,
}

impl RequestArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one request.
    pub fn entry_dir(&self, request_id: Uuid, at: DateTime<Utc>) -> PathBuf {
        self.root
            .join(format!("{}-{request_id}", at.format("%Y%m%d-%H%M%S")))
    }

    /// Write one request's files; returns the directory written.
    pub async fn record(&self, entry: &ArchivedRequest<'_>) -> std::io::Result<PathBuf> {
        let dir = self.entry_dir(entry.request_id, Utc::now());
        tokio::fs::create_dir_all(&dir).await?;

        write_json(&dir.join("params.json"), &entry.params).await?;
        write_json(&dir.join("prompt.json"), entry.prompt).await?;
        write_json(&dir.join("locations.json"), entry.locations).await?;
        write_json(
            &dir.join("response.json"),
            &ArchivedResponse {
                request_id: entry.request_id,
                elapsed_time: entry.elapsed_time,
                result: entry.result,
            },
        )
        .await?;

        if let Some(front) = entry.images.iter().find(|img| img.sector_tag == "front") {
            tokio::fs::write(dir.join("front.jpg"), &front.encoded_image).await?;
        }

        debug!(dir = %dir.display(), "Request archived");
        Ok(dir)
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    let body = serde_json::to_vec_pretty(value).map_err(std::io::Error::other)?;
    tokio::fs::write(path, body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt;
    use sightline_core::generation::{GenerationRequest, SectorTexts};

    fn generation_request(images: Vec<CapturedImage>) -> GenerationRequest {
        GenerationRequest {
            language_code: "en".into(),
            verbosity: Verbosity::default(),
            mode: NarrationMode::Surroundings,
            sector_texts: SectorTexts {
                front: "Front: [Facility in this direction] dummy facility".into(),
                ..SectorTexts::default()
            },
            narration_memory_text: String::new(),
            images,
        }
    }

    fn params(request: &GenerationRequest) -> ArchivedParams<'_> {
        ArchivedParams {
            pose: Pose::new(35.6241, 139.7754, 0.5).unwrap(),
            floor: None,
            max_distance: 15.0,
            max_count: 10,
            language: &request.language_code,
            verbosity: request.verbosity,
            mode: request.mode,
            images: request.images.iter().map(|i| i.sector_tag.as_str()).collect(),
        }
    }

    #[tokio::test]
    async fn writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = RequestArchive::new(dir.path());
        let request = generation_request(vec![
            CapturedImage::new("left", vec![9]),
            CapturedImage::new("front", vec![0xff, 0xd8, 0xff]),
        ]);
        let plan = prompt::single_phase(&request);
        let result = GenerationResult::Success {
            description: "A facility is ahead.".into(),
            translated_description: "A facility is ahead.".into(),
            language_code: "en".into(),
        };
        let request_id = Uuid::new_v4();

        let written = archive
            .record(&ArchivedRequest {
                request_id,
                params: params(&request),
                prompt: &plan,
                locations: &[],
                result: &result,
                elapsed_time: 1.25,
                images: &request.images,
            })
            .await
            .unwrap();

        assert!(written.starts_with(dir.path()));
        assert!(written.to_string_lossy().ends_with(&request_id.to_string()));

        let archived_params: serde_json::Value =
            serde_json::from_slice(&std::fs::read(written.join("params.json")).unwrap()).unwrap();
        assert_eq!(archived_params["heading"], 0.5);
        assert_eq!(archived_params["images"], serde_json::json!(["left", "front"]));

        let archived_prompt: serde_json::Value =
            serde_json::from_slice(&std::fs::read(written.join("prompt.json")).unwrap()).unwrap();
        assert_eq!(archived_prompt["strategy"], "single_phase");
        assert!(archived_prompt["prompt"].as_str().unwrap().contains("dummy facility"));

        let response: serde_json::Value =
            serde_json::from_slice(&std::fs::read(written.join("response.json")).unwrap())
                .unwrap();
        assert_eq!(response["result"]["status"], "success");
        assert_eq!(response["elapsed_time"], 1.25);

        let locations = std::fs::read_to_string(written.join("locations.json")).unwrap();
        assert_eq!(locations.trim(), "[]");
        assert_eq!(
            std::fs::read(written.join("front.jpg")).unwrap(),
            vec![0xff, 0xd8, 0xff]
        );
    }

    #[tokio::test]
    async fn no_front_image_means_no_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let archive = RequestArchive::new(dir.path());
        let request = generation_request(vec![CapturedImage::new("left", vec![1])]);
        let plan = prompt::two_phase(&request);
        let result = GenerationResult::failure("describe phase failed: timeout");

        let written = archive
            .record(&ArchivedRequest {
                request_id: Uuid::new_v4(),
                params: params(&request),
                prompt: &plan,
                locations: &[],
                result: &result,
                elapsed_time: 0.0,
                images: &request.images,
            })
            .await
            .unwrap();

        assert!(!written.join("front.jpg").exists());
        let response: serde_json::Value =
            serde_json::from_slice(&std::fs::read(written.join("response.json")).unwrap())
                .unwrap();
        assert_eq!(response["result"]["status"], "failure");
    }

    #[test]
    fn entry_dir_is_timestamped() {
        let archive = RequestArchive::new("/logs");
        let id = Uuid::nil();
        let at = DateTime::parse_from_rfc3339("2026-03-01T09:30:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            archive.entry_dir(id, at),
            PathBuf::from(format!("/logs/20260301-093005-{id}"))
        );
    }
}
