//! Gemini `generateContent` client.
//!
//! Non-streaming JSON calls tuned for short documentation answers. Quota
//! exhaustion is detected from the error body and mapped to its own error
//! so the caller can tell the user to slow down rather than retry.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{AnswerGenerator, ApiError, GenerateFuture};

/// Default Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";

/// Default model name.
const DEFAULT_MODEL: &str = "gemini-pro";

/// System prompt prefixed to every request.
const SYSTEM_PROMPT: &str = "You are a documentation assistant. Provide concise answers based on the documentation. Use markdown for code and lists. If information isn't available, say so clearly.";

/// Generation temperature; low, for grounded answers.
const TEMPERATURE: f64 = 0.3;
/// Top-k sampling bound.
const TOP_K: u32 = 20;
/// Top-p sampling bound.
const TOP_P: f64 = 0.8;
/// Token budget for one answer.
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// HTTP client timeout for one generation call.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Provider phrase signalling quota exhaustion.
const QUOTA_MARKER: &str = "Resource has been exhausted";

/// Configuration for the Gemini client.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key passed as a query parameter.
    pub api_key: String,
    /// Model name (path segment of the `generateContent` endpoint).
    pub model: String,
    /// API base URL.
    pub base_url: String,
}

impl GeminiConfig {
    /// Build a config for the default model and endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the API key is empty or the base URL is not a
    /// valid URL.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::InvalidConfig(
                "api_key must not be empty".to_string(),
            ));
        }

        Url::parse(&self.base_url)
            .map_err(|err| ApiError::InvalidConfig(format!("base_url: {err}")))?;

        Ok(())
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct SafetySetting<'a> {
    category: &'a str,
    threshold: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Combine the system prompt, page context, and question into one prompt.
fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "{SYSTEM_PROMPT}\n\nDocumentation context:\n{context}\n\nQuestion: {question}\n\nProvide a focused answer. Use markdown formatting where appropriate."
    )
}

/// Build the `generateContent` endpoint, tolerating a trailing slash on
/// the configured base URL.
fn endpoint_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{model}:generateContent",
        base_url.trim_end_matches('/')
    )
}

/// Map a provider error message to the right error variant.
fn error_from_message(message: String) -> ApiError {
    if message.contains(QUOTA_MARKER) {
        ApiError::QuotaExhausted
    } else {
        ApiError::Rejected(message)
    }
}

/// Pull the first candidate's text out of a response body.
fn extract_text(response: GenerateContentResponse) -> Result<String, ApiError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or(ApiError::MalformedResponse)
}

/// Async Gemini client implementing [`AnswerGenerator`].
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Build a client after validating the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, ApiError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()?;

        Ok(Self { client, config })
    }

    /// Generate an answer to `question` grounded in the opaque page
    /// `context` supplied by content extraction.
    ///
    /// # Errors
    /// Returns an [`ApiError`] on transport failure, provider rejection,
    /// quota exhaustion, or a response without a candidate.
    pub async fn generate_response(
        &self,
        question: &str,
        context: &str,
    ) -> Result<String, ApiError> {
        let prompt = build_prompt(question, context);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_k: TOP_K,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
            safety_settings: vec![SafetySetting {
                category: "HARM_CATEGORY_HARASSMENT",
                threshold: "BLOCK_MEDIUM_AND_ABOVE",
            }],
        };

        let endpoint = endpoint_url(&self.config.base_url, &self.config.model);
        debug!("requesting generation from {endpoint}");

        let response = self
            .client
            .post(&endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|error| error.message)
                .unwrap_or_else(|| "API request failed".to_string());
            return Err(error_from_message(message));
        }

        let parsed = response.json::<GenerateContentResponse>().await?;
        extract_text(parsed)
    }

    /// Probe the API key with a minimal request.
    ///
    /// # Errors
    /// Returns an [`ApiError`] if the probe request fails.
    pub async fn validate_api_key(&self) -> Result<(), ApiError> {
        self.generate_response("test", "https://example.com/docs")
            .await
            .map(|_| ())
    }
}

impl AnswerGenerator for GeminiClient {
    fn generate<'a>(&'a self, question: &'a str, context: &'a str) -> GenerateFuture<'a> {
        Box::pin(self.generate_response(question, context))
    }
}
