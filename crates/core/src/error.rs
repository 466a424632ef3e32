//! Error types for the Sightline domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Sightline operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Geometry errors ---
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    // --- Annotation store errors ---
    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotationError),

    // --- Generation produced a tagged failure ---
    #[error("Generation failed: {reason}")]
    Generation { reason: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Rejected geodetic input. Raised before any transform so that NaN never
/// reaches the selector or the narration memory.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} = {value} must be greater than zero")]
    NotPositive { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, Error)]
pub enum AnnotationError {
    #[error("Annotation store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid annotation record: {0}")]
    Invalid(String),
}
