//! Gemini integration for commit message generation
//!
//! This module talks to the `generateContent` REST endpoint and turns its
//! response into plain text. Responses come in a few shapes; they are first
//! classified into a [`ModelReply`] and then normalized by
//! [`ModelReply::into_text`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GenerateError;

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Remote text generation capability.
///
/// This abstraction allows mocking the model in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Send `prompt` to `model` and return the generated text.
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, GenerateError>;
}

/// Client for the Gemini REST API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_base: String,
}

impl GeminiClient {
    /// Create a client for the API rooted at `api_base`
    /// (e.g. `https://generativelanguage.googleapis.com`)
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    /// Endpoint URL for `model`; a leading `models/` in the name is accepted
    pub fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, GenerateError> {
        let url = self.endpoint(model);
        let api_key = api_key.to_string();
        let body = serde_json::to_value(GenerateContentRequest::new(prompt))
            .map_err(|e| GenerateError::InvalidResponse(e.to_string()))?;

        info!(model, prompt_len = prompt.len(), "requesting commit message");

        // ureq blocks; keep it off the async worker
        let response = tokio::task::spawn_blocking(move || post_generate(&url, &api_key, body))
            .await
            .map_err(|e| GenerateError::TaskFailed(e.to_string()))??;

        ModelReply::from(response).into_text()
    }
}

fn post_generate(
    url: &str,
    api_key: &str,
    body: serde_json::Value,
) -> Result<GenerateContentResponse, GenerateError> {
    match ureq::post(url).set(API_KEY_HEADER, api_key).send_json(body) {
        Ok(response) => response
            .into_json::<GenerateContentResponse>()
            .map_err(|e| GenerateError::InvalidResponse(e.to_string())),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(GenerateError::Api {
                status,
                message: api_error_message(&body),
            })
        }
        Err(e) => Err(GenerateError::Transport(e.to_string())),
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw body
fn api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorBody,
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Serialize, Debug)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize, Debug)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

/// `generateContent` response body
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl Candidate {
    fn texts(&self) -> impl Iterator<Item = &str> {
        self.content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
    }
}

/// The shapes a model response can take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// The first candidate carries text directly
    Text(String),
    /// No candidates were returned
    Blocked { reason: String },
    /// The first candidate is empty but other candidates hold text parts
    Fragments(Vec<String>),
    /// Candidates exist but none hold any text
    Empty { finish_reason: Option<String> },
}

impl From<GenerateContentResponse> for ModelReply {
    fn from(response: GenerateContentResponse) -> Self {
        let Some(first) = response.candidates.first() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "unknown".to_string());
            return ModelReply::Blocked { reason };
        };

        let direct: String = first.texts().collect();
        if !direct.trim().is_empty() {
            return ModelReply::Text(direct);
        }

        debug!(
            finish_reason = first.finish_reason.as_deref().unwrap_or("none"),
            "first candidate has no text, collecting fragments"
        );

        let fragments: Vec<String> = response
            .candidates
            .iter()
            .flat_map(Candidate::texts)
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .collect();

        if fragments.is_empty() {
            // First reported finish reason, usually the first candidate's
            let finish_reason = response
                .candidates
                .iter()
                .find_map(|c| c.finish_reason.clone());
            ModelReply::Empty { finish_reason }
        } else {
            ModelReply::Fragments(fragments)
        }
    }
}

impl ModelReply {
    /// Normalize into trimmed text, or a descriptive error when nothing usable came back
    pub fn into_text(self) -> Result<String, GenerateError> {
        let text = match self {
            ModelReply::Text(text) => text,
            ModelReply::Fragments(parts) => parts.join("\n"),
            ModelReply::Blocked { reason } => return Err(GenerateError::Blocked { reason }),
            ModelReply::Empty { finish_reason } => {
                return Err(GenerateError::EmptyResponse { finish_reason });
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerateError::EmptyResponse {
                finish_reason: None,
            });
        }
        Ok(text.to_string())
    }
}
