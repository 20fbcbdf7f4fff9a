//! Google Gemini `generateContent` client.
//!
//! Images travel inline (base64) in the request body, and the reply is
//! constrained with a `responseSchema` so the model can only answer with the
//! JSON structure this module deserializes.

use crate::error::{ErrorKind, Result};
use crate::{Describer, Descriptions, ImageInput};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::instrument;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const BATCH_SYSTEM_INSTRUCTION: &str =
    "You are an expert file naming assistant. Your only output must be the requested JSON structure.";
const SINGLE_SYSTEM_INSTRUCTION: &str =
    "You are an expert file naming assistant. Your only output must be a single JSON object with the key 'short_title'.";
const SINGLE_PROMPT: &str = "Analyze this image and give a concise, descriptive, 3-5 word title. Return only the \
    title in a simple JSON format like: {\"short_title\": \"your title\"}";

/// Gemini-backed [`Describer`].
///
/// # Examples
///
/// ```no_run
/// use retitle_describe::{Describer, GeminiDescriber, ImageInput};
///
/// # async fn example() {
/// let gemini = GeminiDescriber::new("my-api-key", "gemini-2.5-flash").unwrap();
/// let image = ImageInput::new("cat.jpg", "image/jpeg", std::fs::read("cat.jpg").unwrap());
/// let title = gemini.describe_one(&image).await.unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct GeminiDescriber {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiDescriber {
    /// Creates a client for `model`.
    ///
    /// # Errors
    /// Returns [`Credentials`](ErrorKind::Credentials) if `api_key` is blank.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            exn::bail!(ErrorKind::Credentials);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            api_key,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Overrides the API base URL (proxies, regional endpoints, test servers).
    pub fn with_endpoint(mut self, endpoint: impl AsRef<str>) -> Self {
        self.endpoint = endpoint.as_ref().trim().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self) -> String {
        let model = self.model.trim();
        match model.starts_with("models/") {
            true => format!("{}/{model}:generateContent", self.endpoint),
            false => format!("{}/models/{model}:generateContent", self.endpoint),
        }
    }

    /// Sends one request and returns the concatenated text of the first
    /// candidate.
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport_error)?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), body_len = body.len(), "Gemini returned an error status");
            exn::bail!(ErrorKind::from_status(status.as_u16(), error_message(&body)));
        }
        let parsed: GenerateResponse = serde_json::from_str(&body).or_raise(|| ErrorKind::Schema)?;
        parsed.text().ok_or_else(|| exn::Exn::from(ErrorKind::Schema))
    }
}

#[async_trait]
impl Describer for GeminiDescriber {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, images = images.len()))]
    async fn describe_batch(&self, images: &[ImageInput], prompt: &str) -> Result<Descriptions> {
        let mut parts = Vec::with_capacity(images.len() * 2 + 1);
        parts.push(Part::Text(prompt.to_string()));
        for image in images {
            parts.push(Part::inline(image));
            parts.push(Part::Text(format!("Image File: {}", image.filename)));
        }
        let request = GenerateRequest::new(BATCH_SYSTEM_INSTRUCTION, parts, batch_schema());
        let text = self.generate(&request).await?;
        let reply = parse_batch_reply(&text)?;
        tracing::debug!(returned = reply.len(), "Batch described");
        Ok(reply)
    }

    #[instrument(skip_all, fields(model = %self.model, file = %image.filename))]
    async fn describe_one(&self, image: &ImageInput) -> Result<String> {
        let parts = vec![Part::inline(image), Part::Text(SINGLE_PROMPT.to_string())];
        let request = GenerateRequest::new(SINGLE_SYSTEM_INSTRUCTION, parts, single_schema());
        let text = self.generate(&request).await?;
        parse_single_reply(&text)
    }
}

fn classify_transport_error(err: reqwest::Error) -> exn::Exn<ErrorKind> {
    if err.is_builder() {
        return exn::Exn::from(ErrorKind::Request);
    }
    // Timeouts, refused connections, resets mid-body: all worth another go.
    exn::Exn::from(ErrorKind::Transient(err.to_string()))
}

/// Pulls `error.message` out of a Google API error body, falling back to the
/// raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn batch_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "descriptions": {
                "type": "ARRAY",
                "description": "A list of descriptions, one for each image provided.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "original_filename": {
                            "type": "STRING",
                            "description": "The full original filename (including extension) that this description corresponds to."
                        },
                        "short_title": {
                            "type": "STRING",
                            "description": "A concise, descriptive, 3-5 word title for the image content, suitable for a filename."
                        }
                    },
                    "required": ["original_filename", "short_title"]
                }
            }
        },
        "required": ["descriptions"]
    })
}

fn single_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": { "short_title": { "type": "STRING" } },
        "required": ["short_title"]
    })
}

#[derive(Deserialize)]
struct BatchReply {
    descriptions: Vec<ImageDescription>,
}

#[derive(Deserialize)]
struct ImageDescription {
    original_filename: String,
    short_title: String,
}

#[derive(Deserialize)]
struct SingleReply {
    #[serde(default)]
    short_title: Option<String>,
}

fn parse_batch_reply(text: &str) -> Result<Descriptions> {
    let reply: BatchReply = serde_json::from_str(text).or_raise(|| ErrorKind::Schema)?;
    Ok(reply.descriptions.into_iter().map(|d| (d.original_filename, d.short_title)).collect())
}

fn parse_single_reply(text: &str) -> Result<String> {
    let reply: SingleReply = serde_json::from_str(text).or_raise(|| ErrorKind::Schema)?;
    match reply.short_title.map(|t| t.trim().to_string()) {
        Some(title) if !title.is_empty() => Ok(title),
        _ => exn::bail!(ErrorKind::MissingTitle),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}
impl GenerateRequest {
    fn new(system_instruction: &str, parts: Vec<Part>, schema: Value) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text(system_instruction.to_string())],
            },
            contents: vec![Content { role: Some("user"), parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        }
    }
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(Blob),
}
impl Part {
    fn inline(image: &ImageInput) -> Self {
        Self::InlineData(Blob {
            mime_type: image.mime_type.clone(),
            data: BASE64.encode(&image.bytes),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
impl GenerateResponse {
    /// Text of the first candidate, or `None` when the model produced
    /// nothing (safety block, empty candidate list).
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}
