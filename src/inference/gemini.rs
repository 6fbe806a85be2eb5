//! Gemini HTTP transport for the inference capability.
//!
//! One request per operation, no retry: a failed call surfaces to the
//! workflow, which decides what the user sees. Timeouts belong to the
//! transport configuration here, not to the session core.

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::models::{AnalysisResult, ComparisonResult, ImageBinary};

use super::{prompts, schema, InferenceClient, InferenceError};

/// Environment variable holding the access credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Build a client from the environment.
    ///
    /// A missing or empty credential is a configuration error, distinct
    /// from any runtime/network failure.
    pub fn from_env() -> Result<Self, InferenceError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(InferenceError::Configuration)?;
        Ok(Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL, api_key))
    }

    pub fn new(base_url: &str, model: &str, api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one `generateContent` request and return the model's text part.
    async fn generate(
        &self,
        parts: Vec<Part>,
        response_schema: serde_json::Value,
    ) -> Result<String, InferenceError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Http(format!(
                        "request timed out after {REQUEST_TIMEOUT_SECS}s"
                    ))
                } else {
                    InferenceError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            InferenceError::ResponseFormat(format!("unreadable response envelope: {e}"))
        })?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| InferenceError::ResponseFormat("no candidate text".into()))
    }
}

fn image_part(image: &ImageBinary) -> Part {
    Part::InlineData {
        inline_data: Blob {
            mime_type: image.mime_type.clone(),
            data: base64::engine::general_purpose::STANDARD.encode(&image.bytes),
        },
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn analyze(&self, image: &ImageBinary) -> Result<AnalysisResult, InferenceError> {
        tracing::debug!(image = %image.name, "Requesting lesion analysis");
        let parts = vec![
            image_part(image),
            Part::Text {
                text: prompts::analyze_instruction(),
            },
        ];
        let text = self.generate(parts, schema::analysis_schema()).await?;
        schema::parse_analysis(&text)
    }

    async fn compare(
        &self,
        before: &ImageBinary,
        after: &ImageBinary,
    ) -> Result<ComparisonResult, InferenceError> {
        tracing::debug!(before = %before.name, after = %after.name, "Requesting comparison");
        // Wire order carries the meaning: earlier image first.
        let parts = vec![
            image_part(before),
            image_part(after),
            Part::Text {
                text: prompts::compare_instruction(),
            },
        ];
        let text = self.generate(parts, schema::comparison_schema()).await?;
        schema::parse_comparison(&text)
    }
}

// ── Wire types ──────────────────────────────────────────────

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
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Serialize)]
struct Blob {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = GeminiClient::new("https://example.test/", "gemini-2.5-flash", "k".into());
        assert_eq!(client.base_url(), "https://example.test");
    }

    #[test]
    fn image_part_carries_mime_and_base64() {
        let part = image_part(&ImageBinary {
            name: "lesion.png".into(),
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        });
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["inlineData"]["data"], "AQID");
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: "hello".into(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema::analysis_schema(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(json["generationConfig"]["responseSchema"]["required"].is_array());
    }

    #[test]
    fn response_envelope_parses() {
        let raw = r#"{
            "candidates": [
                { "content": { "parts": [ { "text": "{\"ok\":true}" } ] } }
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text = parsed.candidates[0].content.parts[0].text.as_deref();
        assert_eq!(text, Some("{\"ok\":true}"));
    }

    #[test]
    fn empty_candidates_parse_to_empty_vec() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
