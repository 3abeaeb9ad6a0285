use crate::config::{ApiKey, Config};
use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::response::CompletionRequest;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

pub trait CompletionClient: Send + Sync {
    fn complete(&self, credential: &ApiKey, request: &CompletionRequest) -> PipelineResult<String>;
}

/// Gemini `generateContent` client. Stateless: the model is resolved on every call
/// unless one is pinned.
pub struct GeminiClient {
    api_base: String,
    pinned_model: Option<String>,
    http: HttpClient,
}

impl GeminiClient {
    pub fn new(
        api_base: impl Into<String>,
        pinned_model: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("unable to initialise the HTTP client for the completion service")?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            pinned_model: pinned_model.filter(|m| !m.trim().is_empty()),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_base.clone(),
            config.model.clone(),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Names (without the `models/` prefix) of models that support `generateContent`.
    pub fn list_models(&self, credential: &ApiKey) -> PipelineResult<Vec<String>> {
        let response = self
            .authorized(self.http.get(format!("{}/models", self.api_base)), credential)
            .send()
            .map_err(|e| PipelineError::Service(e.to_string()))?;
        let listing: ListModelsResponse = read_json(response)?;
        Ok(listing
            .models
            .into_iter()
            .filter(|model| {
                model.supported_generation_methods.is_empty()
                    || model
                        .supported_generation_methods
                        .iter()
                        .any(|method| method == "generateContent")
            })
            .map(|model| model.name.trim_start_matches("models/").to_string())
            .collect())
    }

    /// The key travels in a header, never in the URL.
    fn authorized(&self, builder: RequestBuilder, credential: &ApiKey) -> RequestBuilder {
        builder.header(API_KEY_HEADER, credential.expose())
    }

    pub fn resolve_model(&self, credential: &ApiKey) -> String {
        if let Some(model) = &self.pinned_model {
            return model.clone();
        }
        match self.list_models(credential) {
            Ok(names) => select_model(&names).unwrap_or_else(|| {
                warn!(available = names.len(), fallback = DEFAULT_MODEL, "no preferred model available");
                DEFAULT_MODEL.to_string()
            }),
            Err(e) => {
                warn!(error = %e, fallback = DEFAULT_MODEL, "model listing failed");
                DEFAULT_MODEL.to_string()
            }
        }
    }
}

impl CompletionClient for GeminiClient {
    fn complete(&self, credential: &ApiKey, request: &CompletionRequest) -> PipelineResult<String> {
        let model = self.resolve_model(credential);
        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.instruction.clone()),
                }],
            }],
            generation_config: request.json_mode.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        info!(%model, task = %request.task, chars = request.instruction.len(), "requesting completion");
        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        let response = self
            .authorized(self.http.post(url), credential)
            .json(&payload)
            .send()
            .map_err(|e| PipelineError::Service(e.to_string()))?;

        let body: GenerateContentResponse = read_json(response)?;
        let text = extract_text(body)?;
        debug!(task = %request.task, chars = text.len(), "completion received");
        Ok(text)
    }
}

/// Preference order: a "flash" model, then a "pro" or "1.5" model.
pub fn select_model<S: AsRef<str>>(names: &[S]) -> Option<String> {
    let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    names
        .iter()
        .find(|name| name.contains("flash"))
        .or_else(|| {
            names
                .iter()
                .find(|name| name.contains("pro") || name.contains("1.5"))
        })
        .map(|name| name.to_string())
}

fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> PipelineResult<T> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| PipelineError::Service(e.to_string()))?;
    if !status.is_success() {
        return Err(PipelineError::Service(provider_message(status.as_u16(), &body)));
    }
    serde_json::from_str(&body)
        .map_err(|e| PipelineError::Service(format!("unreadable provider response: {}", e)))
}

/// The provider's own `error.message` when present, otherwise the status and raw body.
pub fn provider_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => format!("HTTP {}: {}", status, body.trim()),
    }
}

pub fn extract_text(response: GenerateContentResponse) -> PipelineResult<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!("response blocked: {}", reason))
            .unwrap_or_else(|| "provider returned no text".to_string());
        return Err(PipelineError::Service(reason));
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Scripted client for tests: replays queued replies in order and records every request.
#[derive(Clone, Default)]
pub struct MockCompletionClient {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletionClient {
    pub fn push_response(&self, text: impl Into<String>) {
        self.replies.lock().push_back(Ok(text.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies.lock().push_back(Err(message.into()));
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

impl CompletionClient for MockCompletionClient {
    fn complete(&self, _: &ApiKey, request: &CompletionRequest) -> PipelineResult<String> {
        self.requests.lock().push(request.clone());
        match self.replies.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(PipelineError::Service(message)),
            None => Err(PipelineError::Service("no scripted response left".to_string())),
        }
    }
}
