//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, Ollama (`/v1`), vLLM, OpenRouter, and any endpoint that
//! exposes `/v1/chat/completions` with vision input.
//!
//! Supports:
//! - Images as `image_url` content parts carrying JPEG data URIs
//! - Structured output via `response_format: json_schema`
//! - Model listing and health checks

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sightline_core::error::ProviderError;
use sightline_core::provider::*;
use tracing::{debug, warn};

/// An OpenAI-compatible vision/language provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        // Per-call deadlines are enforced by `TimeoutProvider`; this is a
        // backstop for connections that never complete.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    /// Build the chat messages: system preamble, one user message per image,
    /// then the prompt.
    fn to_api_messages(request: &ProviderRequest) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(request.images.len() + 2);
        messages.push(ApiMessage {
            role: "system".into(),
            content: ApiContent::Text(request.system_preamble.clone()),
        });
        for image in &request.images {
            messages.push(ApiMessage {
                role: "user".into(),
                content: ApiContent::Parts(vec![ApiContentPart::ImageUrl {
                    image_url: ApiImageUrl {
                        url: image.data_uri(),
                    },
                }]),
            });
        }
        messages.push(ApiMessage {
            role: "user".into(),
            content: ApiContent::Text(request.prompt.clone()),
        });
        messages
    }

    fn to_request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(request),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let Some(schema) = &request.schema {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.to_json_schema(),
                    "strict": true,
                },
            });
        }

        body
    }

    /// Parse the content of a structured response. Some local models wrap
    /// the JSON in a markdown fence.
    fn parse_structured(content: &str) -> Result<serde_json::Value, ProviderError> {
        let trimmed = content.trim();
        let unfenced = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|s| s.strip_suffix("```"))
            .unwrap_or(trimmed)
            .trim();
        serde_json::from_str(unfenced).map_err(|e| {
            ProviderError::InvalidResponse(format!("structured output is not valid JSON: {e}"))
        })
    }
}

#[async_trait]
impl sightline_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::to_request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            images = request.images.len(),
            structured = request.schema.is_some(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        let content = choice.message.content.unwrap_or_default();
        let parsed = match &request.schema {
            Some(_) => Some(Self::parse_structured(&content)?),
            None => None,
        };

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            content,
            parsed,
            model: api_response.model,
            usage,
        })
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let models = body["data"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Parts(Vec<ApiContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentPart {
    ImageUrl { image_url: ApiImageUrl },
}

#[derive(Debug, Serialize)]
struct ApiImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_core::image::CapturedImage;
    use sightline_core::Provider;

    fn request_with(images: Vec<CapturedImage>, schema: Option<StructuredSchema>) -> ProviderRequest {
        ProviderRequest {
            model: "gpt-4o".into(),
            system_preamble: "You narrate.".into(),
            prompt: "Describe the scene.".into(),
            images,
            schema,
            temperature: 0.0,
            max_tokens: Some(3000),
        }
    }

    #[test]
    fn openai_constructor() {
        let provider = OpenAiCompatProvider::openai("sk-test");
        assert_eq!(provider.name(), "openai");
        assert!(provider.base_url.contains("api.openai.com"));
    }

    #[test]
    fn ollama_constructor() {
        let provider = OpenAiCompatProvider::ollama(None);
        assert_eq!(provider.name(), "ollama");
        assert!(provider.base_url.contains("localhost:11434"));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenAiCompatProvider::new("vllm", "http://localhost:8000/v1/", "");
        assert_eq!(provider.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn images_become_separate_user_messages_before_prompt() {
        let request = request_with(
            vec![
                CapturedImage::new("front", vec![1, 2, 3]),
                CapturedImage::new("left", vec![4, 5, 6]),
            ],
            None,
        );
        let messages = OpenAiCompatProvider::to_api_messages(&request);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");

        let json = serde_json::to_value(&messages).unwrap();
        assert_eq!(json[1]["content"][0]["type"], "image_url");
        assert_eq!(
            json[1]["content"][0]["image_url"]["url"],
            "data:image/jpeg;base64,AQID"
        );
        assert_eq!(json[3]["content"], "Describe the scene.");
    }

    #[test]
    fn schema_becomes_response_format() {
        let schema = StructuredSchema::new("narration", &["description", "translated", "lang"]);
        let body = OpenAiCompatProvider::to_request_body(&request_with(vec![], Some(schema)));
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "narration");
        assert_eq!(body["max_tokens"], 3000);
    }

    #[test]
    fn plain_request_has_no_response_format() {
        let body = OpenAiCompatProvider::to_request_body(&request_with(vec![], None));
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn structured_content_parses_plain_and_fenced_json() {
        let plain = OpenAiCompatProvider::parse_structured(r#"{"lang": "en"}"#).unwrap();
        assert_eq!(plain["lang"], "en");
        let fenced =
            OpenAiCompatProvider::parse_structured("```json\n{\"lang\": \"ja\"}\n```").unwrap();
        assert_eq!(fenced["lang"], "ja");
    }

    #[test]
    fn invalid_structured_content_is_invalid_response() {
        assert!(matches!(
            OpenAiCompatProvider::parse_structured("The scene shows a bench."),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn parse_api_response() {
        let data = r#"{
            "model": "gpt-4o-2024-08-06",
            "choices": [{"message": {"role": "assistant", "content": "{\"lang\":\"en\"}"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.model, "gpt-4o-2024-08-06");
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{\"lang\":\"en\"}"));
        assert_eq!(parsed.usage.unwrap().total_tokens, 15);
    }
}
