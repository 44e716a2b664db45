//! Cover analysis: the pipeline's single network boundary
//!
//! One request per capture attempt, no streaming, no mid-flight
//! cancellation. A recapture simply supersedes the prior result when it
//! later resolves.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::error::AnalysisError;
use crate::types::{AnalysisResult, CapturedImage};

/// Fixed instruction sent with every cover image
const ANALYSIS_PROMPT: &str = "Identify the book title, author, and guess the genre (in Vietnamese) from this book cover. Also provide a short 1-sentence description in Vietnamese.";

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Simulated latency of the placeholder path
const PLACEHOLDER_DELAY: Duration = Duration::from_millis(1500);

/// Extracts structured fields from a normalized cover image
#[async_trait]
pub trait CoverAnalyzer: Send + Sync {
    /// Analyze one cover. Fire-once: failures are surfaced, never retried
    /// here; retry is a user-initiated recapture.
    async fn analyze(&self, image: &CapturedImage) -> Result<AnalysisResult, AnalysisError>;

    /// Whether this analyzer returns canned results instead of calling the
    /// service. Placeholder mode is an explicit, labeled mode, not something
    /// callers should have to sniff out of the result values.
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// Pick the analyzer for the current configuration: the real service when a
/// credential is present, the placeholder otherwise.
pub fn analyzer_from_config(config: &Config) -> Arc<dyn CoverAnalyzer> {
    match &config.api_key {
        Some(key) => Arc::new(GeminiAnalyzer::new(key.clone(), config.model.clone())),
        None => {
            tracing::warn!("no analysis credential configured, running in placeholder mode");
            Arc::new(PlaceholderAnalyzer::new())
        }
    }
}

/// Analyzer backed by the Gemini `generateContent` API
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiAnalyzer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Point at a different service base URL (tests, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_body(&self, image: &CapturedImage) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        // Base64 payload only: any data-URI prefix never
                        // reaches the wire
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type().to_string(),
                            data: image.to_base64(),
                        }),
                        text: None,
                    },
                    Part {
                        inline_data: None,
                        text: Some(ANALYSIS_PROMPT.to_string()),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        }
    }
}

#[async_trait]
impl CoverAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, image: &CapturedImage) -> Result<AnalysisResult, AnalysisError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint, self.model
        );
        tracing::debug!(model = %self.model, bytes = image.as_bytes().len(), "sending cover for analysis");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| AnalysisError::Malformed(e.to_string()))?;
        let text = extract_text(&parsed)?;
        parse_analysis(&text)
    }
}

/// Pull the first candidate's text part out of a service response
fn extract_text(response: &GenerateResponse) -> Result<String, AnalysisError> {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| content.parts.first())
        .and_then(|part| part.text.clone())
        .filter(|text| !text.trim().is_empty())
        .ok_or(AnalysisError::EmptyResponse)
}

/// Parse the model's JSON payload and enforce the required-field contract
fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let result: AnalysisResult =
        serde_json::from_str(text).map_err(|e| AnalysisError::Malformed(e.to_string()))?;
    if !result.has_required_fields() {
        return Err(AnalysisError::Malformed(
            "response missing required field (title, author, genre)".to_string(),
        ));
    }
    Ok(result)
}

fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "author": { "type": "STRING" },
            "genre": { "type": "STRING" },
            "description": { "type": "STRING" }
        },
        "required": ["title", "author", "genre"]
    })
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(rename = "inline_data", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
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

/// Deterministic fallback used when no service credential is configured.
///
/// Exists so the capture pipeline stays exercisable without external
/// dependencies; every call returns the same fixed Vietnamese result after a
/// short simulated delay.
pub struct PlaceholderAnalyzer {
    delay: Duration,
}

impl PlaceholderAnalyzer {
    pub fn new() -> Self {
        Self {
            delay: PLACEHOLDER_DELAY,
        }
    }

    /// Override the simulated latency (tests)
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    /// The fixed result every call returns
    pub fn fixed_result() -> AnalysisResult {
        AnalysisResult {
            title: Some("Tiêu đề sách".to_string()),
            author: Some("Tác giả".to_string()),
            genre: Some("Tiểu thuyết".to_string()),
            description: Some(
                "Đây là mô tả mô phỏng bằng tiếng Việt vì không tìm thấy khóa API.".to_string(),
            ),
        }
    }
}

impl Default for PlaceholderAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoverAnalyzer for PlaceholderAnalyzer {
    async fn analyze(&self, _image: &CapturedImage) -> Result<AnalysisResult, AnalysisError> {
        tokio::time::sleep(self.delay).await;
        Ok(Self::fixed_result())
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}
