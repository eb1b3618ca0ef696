//! Summarization entry points.
//!
//! [`Summarizer`] owns the immutable configuration plus the resolved backend,
//! tokenizer and observer, and runs one request at a time through:
//!
//! ```text
//! CaptureInput ─▶ merge ─▶ admit ─▶ classify URL ─▶ assemble ─▶ backend ─▶ Summary
//! ```
//!
//! Everything before the backend call is synchronous and cheap, so a request
//! that will be rejected never costs a remote call. Every failure is returned
//! as a [`SummaryError`] value.

use crate::config::SummarizerConfig;
use crate::error::SummaryError;
use crate::observer::{NoopObserver, SummaryObserver};
use crate::output::{Summary, SummaryResult};
use crate::pipeline::admission::{admit, admit_pdf_text};
use crate::pipeline::assemble::assemble;
use crate::pipeline::llm::{call_backend, EdgequakeBackend, SummaryBackend};
use crate::pipeline::merge::{merge_sources, Attachment, ContentPath, ContentSource, SummaryRequest};
use crate::pipeline::tokens::{TiktokenCounter, Tokenizer};
use crate::prompts::select_prompt;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything captured for one request, already reduced to text and bytes.
#[derive(Debug, Clone, Default)]
pub struct CaptureInput {
    /// Source page URL. May be empty when content is supplied directly.
    pub page_url: String,
    pub sources: Vec<ContentSource>,
    /// Screenshots in submission order; only the first is sent.
    pub images: Vec<Attachment>,
    /// Free-text caller overrides appended to the instruction.
    pub additional_instructions: Option<String>,
}

impl CaptureInput {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: ContentSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_image(mut self, image: Attachment) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.additional_instructions = Some(instructions.into());
        self
    }

    /// True when there is a URL or at least one content source.
    ///
    /// HTML and OCR text only count when non-blank. PDF and extracted-text
    /// sources count as soon as they are present: the client explicitly chose
    /// that path, and an empty one is reported as [`SummaryError::ExtractionEmpty`].
    pub fn has_content(&self) -> bool {
        !self.page_url.trim().is_empty()
            || !self.images.is_empty()
            || self.sources.iter().any(|s| match s {
                ContentSource::HtmlText(t) | ContentSource::OcrText(t) => !t.trim().is_empty(),
                ContentSource::ExtractedText(_) | ContentSource::PdfText(_) => true,
            })
    }
}

/// The summarization engine. Cheap to clone; clones share configuration.
#[derive(Clone)]
pub struct Summarizer {
    inner: Arc<Inner>,
}

struct Inner {
    config: SummarizerConfig,
    backend: Arc<dyn SummaryBackend>,
    tokenizer: Arc<dyn Tokenizer>,
    observer: Arc<dyn SummaryObserver>,
}

impl Summarizer {
    /// Resolve backend, tokenizer and observer from `config`.
    pub fn new(config: SummarizerConfig) -> Result<Self, SummaryError> {
        let backend = resolve_backend(&config)?;
        let tokenizer: Arc<dyn Tokenizer> = match config.tokenizer {
            Some(ref t) => Arc::clone(t),
            None => Arc::new(TiktokenCounter::for_model(&config.effective_model())?),
        };
        let observer: Arc<dyn SummaryObserver> = match config.observer {
            Some(ref o) => Arc::clone(o),
            None => Arc::new(NoopObserver),
        };
        debug!("Summarizer ready: {:?}", config);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                backend,
                tokenizer,
                observer,
            }),
        })
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.inner.config
    }

    /// Summarise one capture.
    ///
    /// Dropping the returned future drops the in-flight backend call with it.
    pub async fn summarize(&self, input: CaptureInput) -> SummaryResult {
        let page_url = input.page_url.clone();
        let observer = &self.inner.observer;
        observer.on_request(&page_url);

        let result = self.run(input).await;
        match &result {
            Ok(summary) => {
                info!(
                    "Summary generated ({} chars, template {})",
                    summary.text.len(),
                    summary.template
                );
                observer.on_summary(&page_url, summary);
            }
            Err(e) => {
                warn!("Summarization failed: {}", e);
                observer.on_failure(&page_url, e);
            }
        }
        result
    }

    /// Like [`Summarizer::summarize`], but gives up as soon as `cancel`
    /// completes, dropping the in-flight backend call.
    pub async fn summarize_with_cancel<F>(&self, input: CaptureInput, cancel: F) -> SummaryResult
    where
        F: Future<Output = ()>,
    {
        let page_url = input.page_url.clone();
        tokio::select! {
            biased;
            _ = cancel => {
                info!("Summarization cancelled by caller");
                let err = SummaryError::Cancelled;
                self.inner.observer.on_failure(&page_url, &err);
                Err(err)
            }
            result = self.summarize(input) => result,
        }
    }

    /// Synchronous wrapper around [`Summarizer::summarize`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from async code.
    pub fn summarize_sync(&self, input: CaptureInput) -> SummaryResult {
        tokio::runtime::Runtime::new()
            .map_err(|e| SummaryError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.summarize(input))
    }

    async fn run(&self, input: CaptureInput) -> SummaryResult {
        let config = &self.inner.config;
        let observer = &self.inner.observer;

        // ── Step 1: Anything to work with? ───────────────────────────────────
        if !input.has_content() {
            return Err(SummaryError::NoContentProvided);
        }
        for source in &input.sources {
            observer.on_source(source);
        }

        // ── Step 2: Merge sources ────────────────────────────────────────────
        let merged = merge_sources(&input.sources, &input.images, config.merge_policy);
        let label = merged.path.label();
        debug!(
            "Content path: {} ({} chars, image: {})",
            label,
            merged.path.text().len(),
            merged.attachment.is_some()
        );

        // ── Step 3: Admission ────────────────────────────────────────────────
        let (text, admitted_size, truncated) = match merged.path {
            ContentPath::Pdf(text) => {
                let admitted = admit_pdf_text(&text, config.pdf_max_chars)?;
                let size = admitted.text.chars().count();
                (admitted.text, size, admitted.truncated)
            }
            ContentPath::Extracted(text) => {
                if text.trim().is_empty() {
                    return Err(SummaryError::ExtractionEmpty {
                        source_kind: label.to_string(),
                    });
                }
                let admitted = admit(&text, &config.budget, self.inner.tokenizer.as_ref())?;
                (text, admitted.tokens, false)
            }
            ContentPath::Page(text) => {
                let admitted = admit(&text, &config.budget, self.inner.tokenizer.as_ref())?;
                if text.trim().is_empty() {
                    return Err(SummaryError::TooShort {
                        tokens: admitted.tokens,
                        min: config.budget.min_tokens,
                    });
                }
                (text, admitted.tokens, false)
            }
        };
        observer.on_admitted(label, admitted_size, truncated);

        let request = SummaryRequest {
            merged_text: text,
            source_url: input.page_url,
            attachment: merged.attachment,
            additional_instructions: input.additional_instructions,
        };

        // ── Step 4: Classify URL, select instruction ─────────────────────────
        let prompt = select_prompt(
            &request.source_url,
            request.additional_instructions.as_deref(),
        );
        info!("Using template: {}", prompt.kind);
        observer.on_prompt_selected(prompt.kind, &prompt.instruction);

        // ── Step 5: Assemble and call the backend ────────────────────────────
        let template = prompt.kind;
        let backend_request = assemble(prompt.instruction, &request, &config.budget);
        let completion = call_backend(
            self.inner.backend.as_ref(),
            &backend_request,
            config.api_timeout(),
        )
        .await?;

        Ok(Summary {
            text: completion.text,
            template,
            content_path: label.to_string(),
            admitted_size,
            truncated,
            with_image: backend_request.image.is_some(),
            prompt_tokens: completion.prompt_tokens,
            completion_tokens: completion.completion_tokens,
            duration_ms: completion.duration_ms,
        })
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, SummaryError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SummaryError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the backend, from most-specific to least-specific:
///
/// 1. **Pre-built backend** (`config.backend`), used as-is.
/// 2. **Pre-built provider** (`config.provider`), wrapped in [`EdgequakeBackend`].
/// 3. **Named provider + model** (`config.provider_name`).
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 5. **OpenAI** when `OPENAI_API_KEY` is set.
/// 6. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_backend(config: &SummarizerConfig) -> Result<Arc<dyn SummaryBackend>, SummaryError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    let model = config.effective_model();

    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(EdgequakeBackend::new(Arc::clone(provider), "custom")));
    }

    if let Some(ref name) = config.provider_name {
        let provider = create_provider(name, &model)?;
        return Ok(Arc::new(EdgequakeBackend::new(provider, name.as_str())));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            let provider = create_provider(&prov, &env_model)?;
            return Ok(Arc::new(EdgequakeBackend::new(provider, prov.as_str())));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let provider = create_provider("openai", &model)?;
            return Ok(Arc::new(EdgequakeBackend::new(provider, "openai")));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SummaryError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(EdgequakeBackend::new(llm_provider, "auto")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_content() {
        assert!(!CaptureInput::default().has_content());
        let blank = CaptureInput::new("  ").with_source(ContentSource::HtmlText(" \n".into()));
        assert!(!blank.has_content());
    }

    #[test]
    fn url_alone_is_content() {
        assert!(CaptureInput::new("https://example.com").has_content());
    }

    #[test]
    fn pdf_flag_alone_is_content() {
        let input = CaptureInput::default().with_source(ContentSource::PdfText(String::new()));
        assert!(input.has_content());
    }
}
