//! # Sightline Core
//!
//! Domain types, traits, and error definitions for the Sightline narration
//! pipeline. This crate has **no runtime dependencies** beyond serde, thiserror,
//! base64 and the async-trait shim: it defines the model every other crate
//! builds against.
//!
//! ## Layout
//!
//! - [`geo`] — poses and the tangent-plane transform into robot-relative meters
//! - [`sector`] — bearing → Front/Left/Right/Back classification
//! - [`annotation`] — pre-authored location annotations and the source trait
//! - [`image`] — captured directional images
//! - [`generation`] — generation requests, tagged results, the output contract
//! - [`provider`] — the trait over generative model backends
//!
//! Implementations live in their respective crates, so each seam can be
//! swapped via configuration or replaced by a stub in tests.

pub mod error;
pub mod geo;
pub mod sector;
pub mod annotation;
pub mod image;
pub mod generation;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use geo::{GeoPoint, Pose, RelativeOffset};
pub use sector::Sector;
pub use annotation::{AnnotationRecord, AnnotationSource, NearbyQuery};
pub use image::CapturedImage;
pub use generation::{
    GenerationRequest, GenerationResult, NarrationMode, NarrationOutput, SectorTexts, Verbosity,
};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StructuredSchema};
