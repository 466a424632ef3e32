//! Provider trait — the abstraction over generative model backends.
//!
//! A Provider takes a system preamble, a prompt, zero or more images and an
//! optional structured-output schema, and returns the generated text (and the
//! parsed fields when a schema was requested).
//!
//! Implementations: OpenAI-compatible HTTP endpoints (OpenAI, Ollama, vLLM),
//! a dummy provider for offline runs, and test stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::image::CapturedImage;

/// A single call to a generative model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o", "llama3.2-vision")
    pub model: String,

    /// System instructions sent before the user content
    pub system_preamble: String,

    /// The user prompt
    pub prompt: String,

    /// Images attached to the prompt, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<CapturedImage>,

    /// Structured output schema; when set, the response must be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<StructuredSchema>,

    /// Temperature (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A flat structured-output schema: an object whose fields are all strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSchema {
    /// Schema name (sent to backends that require one)
    pub name: String,

    /// Required string fields, in declaration order
    pub fields: Vec<String>,
}

impl StructuredSchema {
    pub fn new(name: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// JSON Schema for this structure.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|f| (f.clone(), serde_json::json!({ "type": "string" })))
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.fields,
            "additionalProperties": false,
        })
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The raw generated text
    pub content: String,

    /// Parsed structured output, present when the request carried a schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<serde_json::Value>,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ProviderResponse {
    /// A plain-text response with no structured payload.
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            parsed: None,
            model: model.into(),
            usage: None,
        }
    }

    /// Read one string field from the structured payload.
    pub fn field(&self, name: &str) -> Result<String, ProviderError> {
        let parsed = self.parsed.as_ref().ok_or_else(|| {
            ProviderError::InvalidResponse("response carries no structured output".into())
        })?;
        parsed
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse(format!("missing string field '{name}'")))
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Generation strategies call `generate()` without knowing which backend is
/// behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn generate(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// List available models for this provider.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lists_every_field_as_required_string() {
        let schema = StructuredSchema::new("narration", &["description", "translated", "lang"]);
        let json = schema.to_json_schema();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["lang"]["type"], "string");
        assert_eq!(json["required"].as_array().unwrap().len(), 3);
        assert_eq!(json["additionalProperties"], false);
    }

    #[test]
    fn field_reads_structured_payload() {
        let response = ProviderResponse {
            content: String::new(),
            parsed: Some(serde_json::json!({ "description": "hello", "count": 3 })),
            model: "m".into(),
            usage: None,
        };
        assert_eq!(response.field("description").unwrap(), "hello");
        assert!(matches!(
            response.field("count"),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn field_without_payload_is_invalid_response() {
        let response = ProviderResponse::text("m", "plain text");
        assert!(matches!(
            response.field("description"),
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
