//! LLM Client — the single point of entry for generative model calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Generative Language API directly.
//! The forecast pipeline depends only on the `GenerativeForecastClient` trait.
//!
//! One request per call, no retries. Retrying is the caller's decision.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Unparsed model reply. Never mutated after it is received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelResponse(String);

impl RawModelResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Sends a prompt to an external text generator and returns its reply verbatim.
#[async_trait]
pub trait GenerativeForecastClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<RawModelResponse, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Wraps the Generative Language `generateContent` endpoint, text output only,
/// optionally grounded with the web search tool.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    web_search: bool,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        web_search: bool,
        timeout: std::time::Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            web_search,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        let tools = if self.web_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            tools,
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT"],
            },
        }
    }
}

#[async_trait]
impl GenerativeForecastClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<RawModelResponse, LlmError> {
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &body.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        body.text()
            .map(RawModelResponse::new)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(web_search: bool) -> GeminiClient {
        GeminiClient::new(
            "test-key".to_string(),
            "gemini-2.0-flash".to_string(),
            web_search,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_request_body_with_web_search() {
        let body = serde_json::to_value(client(true).request_body("Forecast Wales")).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Forecast Wales");
        assert!(body["tools"][0]["google_search"].is_object());
        assert_eq!(body["generationConfig"]["responseModalities"][0], "TEXT");
    }

    #[test]
    fn test_request_body_without_web_search_omits_tools() {
        let body = serde_json::to_value(client(false).request_body("x")).unwrap();
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "I will analyze "}, {"text": "the data."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text().as_deref(), Some("I will analyze the data."));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(response.text().is_none());
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.text().is_none());
    }
}
