//! Offline provider for demos and pipeline tests.
//!
//! Answers every call without network access. Structured requests get every
//! schema field filled with a placeholder value.

use async_trait::async_trait;
use sightline_core::error::ProviderError;
use sightline_core::provider::*;
use tracing::debug;

pub const DUMMY_CONTENT: &str = "This is a dummy response.";
pub const DUMMY_FIELD_VALUE: &str = "dummy_value";

#[derive(Debug, Default)]
pub struct DummyProvider;

impl DummyProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl sightline_core::Provider for DummyProvider {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn generate(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        debug!(model = %request.model, images = request.images.len(), "Dummy generation");

        let Some(schema) = &request.schema else {
            return Ok(ProviderResponse::text(request.model, DUMMY_CONTENT));
        };

        let parsed: serde_json::Map<String, serde_json::Value> = schema
            .fields
            .iter()
            .map(|f| (f.clone(), serde_json::Value::String(DUMMY_FIELD_VALUE.into())))
            .collect();
        let parsed = serde_json::Value::Object(parsed);

        Ok(ProviderResponse {
            content: parsed.to_string(),
            parsed: Some(parsed),
            model: request.model,
            usage: None,
        })
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(vec!["dummy".into()])
    }
}
