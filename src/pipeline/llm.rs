//! Backend adapter: call the remote model once and validate what comes back.
//!
//! [`SummaryBackend`] is the seam between the engine and any remote model.
//! [`EdgequakeBackend`] implements it over an `edgequake_llm::LLMProvider`;
//! tests implement it with stubs.
//!
//! ## Failure mapping
//!
//! | Observation | Error |
//! |-------------|-------|
//! | transport error, provider error, timeout | [`SummaryError::BackendUnavailable`] |
//! | no candidates, or first candidate has no text | [`SummaryError::BackendProtocolError`] |
//! | blank text, content filter, explicit refusal | [`SummaryError::BackendRefused`] |
//!
//! There is no retry loop: one failed attempt is surfaced to the caller.

use crate::error::SummaryError;
use crate::pipeline::assemble::BackendRequest;
use crate::pipeline::encode::encode_attachment;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// One completion alternative returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
}

/// Raw backend response, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendResponse {
    pub candidates: Vec<Candidate>,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl BackendResponse {
    /// A response with one candidate carrying `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(text.into()),
                finish_reason: Some("stop".into()),
            }],
            ..Default::default()
        }
    }
}

/// Failure raised by a backend implementation before any response exists.
#[derive(Debug, Clone, Error)]
pub enum BackendCallError {
    /// Could not reach the backend, or the provider reported an error.
    #[error("{0}")]
    Transport(String),
    /// The backend explicitly declined the request.
    #[error("{0}")]
    Refused(String),
}

/// A remote summarization backend.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    async fn complete(&self, request: &BackendRequest) -> Result<BackendResponse, BackendCallError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "backend"
    }
}

/// Validated backend output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Trimmed, otherwise verbatim.
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
}

/// Issue one backend call under `timeout` and validate the response.
pub async fn call_backend(
    backend: &dyn SummaryBackend,
    request: &BackendRequest,
    timeout: Duration,
) -> Result<Completion, SummaryError> {
    let start = Instant::now();

    let response = match tokio::time::timeout(timeout, backend.complete(request)).await {
        Err(_) => {
            warn!("{}: no response after {:?}", backend.name(), timeout);
            return Err(SummaryError::BackendUnavailable {
                reason: format!("timed out after {}ms", timeout.as_millis()),
            });
        }
        Ok(Err(BackendCallError::Transport(reason))) => {
            warn!("{}: call failed: {}", backend.name(), reason);
            return Err(SummaryError::BackendUnavailable { reason });
        }
        Ok(Err(BackendCallError::Refused(reason))) => {
            warn!("{}: refused: {}", backend.name(), reason);
            return Err(SummaryError::BackendRefused { reason });
        }
        Ok(Ok(response)) => response,
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let text = validate_response(&response)?;
    debug!(
        "{}: {} input tokens, {} output tokens, {}ms",
        backend.name(),
        response.prompt_tokens,
        response.completion_tokens,
        duration_ms
    );

    Ok(Completion {
        text,
        prompt_tokens: response.prompt_tokens,
        completion_tokens: response.completion_tokens,
        duration_ms,
    })
}

/// Check the response shape and return the trimmed summary text.
pub fn validate_response(response: &BackendResponse) -> Result<String, SummaryError> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| SummaryError::BackendProtocolError {
            detail: "response contained no completion candidates".into(),
        })?;

    if candidate.finish_reason.as_deref() == Some("content_filter") {
        return Err(SummaryError::BackendRefused {
            reason: "content filter triggered".into(),
        });
    }

    let content = candidate
        .content
        .as_deref()
        .ok_or_else(|| SummaryError::BackendProtocolError {
            detail: "first candidate carried no text content".into(),
        })?;

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(SummaryError::BackendRefused {
            reason: "backend returned an empty summary".into(),
        });
    }
    Ok(trimmed.to_string())
}

// ── edgequake-llm ────────────────────────────────────────────────────────────

/// [`SummaryBackend`] over any edgequake-llm provider.
pub struct EdgequakeBackend {
    provider: Arc<dyn LLMProvider>,
    name: String,
}

impl EdgequakeBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
        }
    }
}

#[async_trait]
impl SummaryBackend for EdgequakeBackend {
    async fn complete(&self, request: &BackendRequest) -> Result<BackendResponse, BackendCallError> {
        let messages = build_messages(request);
        let options = build_options(request);

        match self.provider.chat(&messages, Some(&options)).await {
            Ok(response) => Ok(BackendResponse {
                candidates: vec![Candidate {
                    content: Some(response.content),
                    finish_reason: None,
                }],
                prompt_tokens: response.prompt_tokens,
                completion_tokens: response.completion_tokens,
            }),
            Err(e) => Err(classify_provider_error(&e.to_string())),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Provider errors that mention a content filter are refusals; everything
/// else is a transport failure.
fn classify_provider_error(message: &str) -> BackendCallError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("content_filter") || lower.contains("content filter") {
        BackendCallError::Refused(message.to_string())
    } else {
        BackendCallError::Transport(message.to_string())
    }
}

/// System message with the instruction, user message with text and image.
fn build_messages(request: &BackendRequest) -> Vec<ChatMessage> {
    let user = match request.image {
        Some(ref image) => {
            ChatMessage::user_with_images(request.user_text.as_str(), vec![encode_attachment(image)])
        }
        None => ChatMessage::user(request.user_text.as_str()),
    };
    vec![ChatMessage::system(request.instruction.as_str()), user]
}

fn build_options(request: &BackendRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_output_tokens),
        ..Default::default()
    }
}
