//! Contextual narration for Sightline.
//!
//! - [`selector`] — nearest priority annotation per sector, decorated
//! - [`prompt`] — prompt plans and structured-output schemas
//! - [`orchestrator`] — single- and two-phase generation strategies
//! - [`pipeline`] — one request end to end, with the shared narration memory
//! - [`archive`] — optional per-request archive on disk

pub mod archive;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod selector;

pub use archive::RequestArchive;
pub use orchestrator::{
    BackendSettings, GenerationBackend, SinglePhaseBackend, TwoPhaseBackend, build_backend,
    build_from_config,
};
pub use pipeline::{AssemblyPipeline, Narration, NarrationQuery, PipelineSettings};
pub use prompt::PromptPlan;
pub use selector::{AnnotationSelector, ProcessedAnnotation, SectorSelection};
