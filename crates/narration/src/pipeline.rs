//! Assembly pipeline — one narration request end to end.
//!
//! ```text
//! pose ─► find_nearby ─► select ─► memory.collect_and_prune ─► generate ─► memory.append
//! ```
//!
//! The narration memory is injected at construction and shared by every
//! request the pipeline serves. With a log directory configured, each request
//! is also written to a [`RequestArchive`].

use serde::{Deserialize, Serialize};
use sightline_config::AppConfig;
use sightline_core::annotation::{AnnotationRecord, AnnotationSource, NearbyQuery};
use sightline_core::error::{Error, GeometryError, Result};
use sightline_core::generation::{
    GenerationRequest, GenerationResult, NarrationMode, NarrationOutput, Verbosity,
};
use sightline_core::geo::Pose;
use sightline_core::image::CapturedImage;
use sightline_memory::NarrationMemory;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::archive::{ArchivedParams, ArchivedRequest, RequestArchive};
use crate::orchestrator::GenerationBackend;
use crate::selector::{AnnotationSelector, SectorSelection};

/// One narration request as received from the calling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationQuery {
    #[serde(flatten)]
    pub pose: Pose,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,

    /// Overrides `narration.max_distance`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,

    /// Overrides `narration.max_count`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,

    /// Overrides `narration.default_language`
    #[serde(default, alias = "lang", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,

    #[serde(default)]
    pub mode: NarrationMode,

    #[serde(default)]
    pub images: Vec<CapturedImage>,
}

impl NarrationQuery {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            floor: None,
            max_distance: None,
            max_count: None,
            language: None,
            verbosity: None,
            mode: NarrationMode::default(),
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<CapturedImage>) -> Self {
        self.images = images;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_mode(mut self, mode: NarrationMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Everything one request produced.
#[derive(Debug, Clone)]
pub struct Narration {
    pub request_id: Uuid,
    /// Annotations the store returned, before selection
    pub locations: Vec<AnnotationRecord>,
    pub selection: SectorSelection,
    /// Seconds spent in generation
    pub elapsed_time: f64,
    pub result: GenerationResult,
}

impl Narration {
    /// The output contract; a failed generation becomes `Error::Generation`.
    pub fn into_output(self) -> Result<NarrationOutput> {
        match self.result {
            GenerationResult::Success {
                description,
                translated_description,
                language_code,
            } => Ok(NarrationOutput {
                description,
                translated: translated_description,
                lang: language_code,
                elapsed_time: self.elapsed_time,
                locations: self.locations,
            }),
            GenerationResult::Failure { reason } => Err(Error::Generation { reason }),
        }
    }
}

/// Request defaults and limits taken from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub default_language: String,
    pub default_verbosity: Verbosity,
    pub max_distance: f64,
    pub max_count: usize,
    pub request_deadline: Duration,
    /// Whether remembered narrations reach the prompt
    pub use_past_explanations: bool,
    /// Archive every request under this directory
    pub log_dir: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            default_language: config.narration.default_language.clone(),
            default_verbosity: Verbosity::new(
                config.narration.verbosity_level,
                config.narration.distance_to_travel,
            ),
            max_distance: config.narration.max_distance,
            max_count: config.narration.max_count,
            request_deadline: Duration::from_secs(config.narration.request_deadline_secs),
            use_past_explanations: config.memory.use_past_explanations,
            log_dir: config.narration.log_dir.as_ref().map(PathBuf::from),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Composes annotation lookup, selection, narration memory and generation.
pub struct AssemblyPipeline {
    annotations: Arc<dyn AnnotationSource>,
    backend: Arc<dyn GenerationBackend>,
    memory: NarrationMemory,
    selector: AnnotationSelector,
    archive: Option<RequestArchive>,
    settings: PipelineSettings,
}

impl AssemblyPipeline {
    pub fn new(
        annotations: Arc<dyn AnnotationSource>,
        backend: Arc<dyn GenerationBackend>,
        memory: NarrationMemory,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            annotations,
            backend,
            memory,
            selector: AnnotationSelector::new(),
            archive: settings.log_dir.clone().map(RequestArchive::new),
            settings,
        }
    }

    pub fn memory(&self) -> &NarrationMemory {
        &self.memory
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Serve one request. Errors only on malformed input; a failed generation
    /// is reported inside the returned `Narration`.
    pub async fn narrate(&self, query: NarrationQuery) -> Result<Narration> {
        query.pose.validate()?;

        let request_id = Uuid::new_v4();
        let span = info_span!(
            "narration",
            request_id = %request_id,
            backend = %self.backend.name(),
            mode = ?query.mode,
        );
        self.run(request_id, query).instrument(span).await
    }

    /// `narrate` followed by `Narration::into_output`.
    pub async fn describe(&self, query: NarrationQuery) -> Result<NarrationOutput> {
        self.narrate(query).await?.into_output()
    }

    async fn run(&self, request_id: Uuid, query: NarrationQuery) -> Result<Narration> {
        let pose = query.pose;
        let max_distance = query.max_distance.unwrap_or(self.settings.max_distance);
        if !max_distance.is_finite() {
            return Err(GeometryError::NonFinite { field: "max_distance" }.into());
        }
        if max_distance <= 0.0 {
            return Err(GeometryError::NotPositive {
                field: "max_distance",
                value: max_distance,
            }
            .into());
        }

        let max_count = query.max_count.unwrap_or(self.settings.max_count);
        let nearby = NearbyQuery {
            point: pose.point(),
            floor: query.floor,
            max_distance,
            max_count: Some(max_count),
        };
        let locations = match self.annotations.find_nearby(&nearby).await {
            Ok(records) => records,
            Err(e) => {
                warn!(source = %self.annotations.name(), error = %e, "Annotation lookup failed; narrating without annotations");
                Vec::new()
            }
        };

        let selection = self.selector.select(&pose, &locations);

        let remembered = self.memory.collect_and_prune(&pose, max_distance).await;
        let narration_memory_text = if self.settings.use_past_explanations {
            remembered
        } else {
            String::new()
        };
        debug!(
            locations = locations.len(),
            remembered = !narration_memory_text.is_empty(),
            "Request assembled"
        );

        let request = GenerationRequest {
            language_code: query
                .language
                .unwrap_or_else(|| self.settings.default_language.clone()),
            verbosity: query.verbosity.unwrap_or(self.settings.default_verbosity),
            mode: query.mode,
            sector_texts: selection.texts(),
            narration_memory_text,
            images: query.images,
        };

        let started = Instant::now();
        let result =
            match tokio::time::timeout(self.settings.request_deadline, self.backend.generate(&request))
                .await
            {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        deadline_secs = self.settings.request_deadline.as_secs(),
                        "Generation missed the request deadline"
                    );
                    GenerationResult::failure(format!(
                        "request deadline of {}s exceeded",
                        self.settings.request_deadline.as_secs()
                    ))
                }
            };
        let elapsed_time = started.elapsed().as_secs_f64();

        match &result {
            GenerationResult::Success {
                description,
                translated_description,
                language_code,
            } => {
                info!(elapsed_time, "Time taken");
                info!(%description, "Generated description");
                info!(translated = %translated_description, "Translated description");
                info!(lang = %language_code, "Language");
                self.memory
                    .append(description.clone(), pose.lat, pose.lng)
                    .await;
            }
            GenerationResult::Failure { reason } => {
                warn!(elapsed_time, %reason, "Generation failed");
            }
        }

        if let Some(archive) = &self.archive {
            let prompt = self.backend.build_prompt(&request);
            let entry = ArchivedRequest {
                request_id,
                params: ArchivedParams {
                    pose,
                    floor: query.floor,
                    max_distance,
                    max_count,
                    language: &request.language_code,
                    verbosity: request.verbosity,
                    mode: request.mode,
                    images: request.images.iter().map(|i| i.sector_tag.as_str()).collect(),
                },
                prompt: &prompt,
                locations: &locations,
                result: &result,
                elapsed_time,
                images: &request.images,
            };
            if let Err(e) = archive.record(&entry).await {
                warn!(root = %archive.root().display(), error = %e, "Failed to archive request");
            }
        }

        Ok(Narration {
            request_id,
            locations,
            selection,
            elapsed_time,
            result,
        })
    }
}
