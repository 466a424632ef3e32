//! Generation provider implementations for Sightline.
//!
//! All providers implement the `sightline_core::Provider` trait.
//! The router selects the correct provider based on configuration and bounds
//! every call with the configured timeout.

pub mod dummy;
pub mod openai_compat;
pub mod router;
pub mod timeout;

pub use dummy::DummyProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
pub use timeout::TimeoutProvider;
