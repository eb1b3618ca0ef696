//! Configuration types for the summarization engine.
//!
//! All engine behaviour is controlled through [`SummarizerConfig`], built via
//! its [`SummarizerConfigBuilder`]. The config is constructed once at startup,
//! wrapped in an `Arc` by [`crate::Summarizer`], and never mutated afterwards,
//! so concurrent requests share it without locking.
//!
//! Sampling temperature is not a field: generation is always deterministic
//! (see [`crate::pipeline::assemble::TEMPERATURE`]).

use crate::error::SummaryError;
use crate::observer::SummaryObserver;
use crate::pipeline::llm::SummaryBackend;
use crate::pipeline::merge::MergePolicy;
use crate::pipeline::tokens::Tokenizer;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Token thresholds, in the backend tokenizer's units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Inputs below this are rejected as too short. Default: 50.
    pub min_tokens: usize,
    /// Inputs above this are rejected as too long. Default: 10 000.
    pub max_tokens: usize,
    /// Hard cap on generated summary length. Default: 4096.
    pub max_output_tokens: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            min_tokens: 50,
            max_tokens: 10_000,
            max_output_tokens: 4096,
        }
    }
}

/// Immutable engine configuration.
///
/// # Example
/// ```rust
/// use edgequake_summarize::{MergePolicy, SummarizerConfig};
///
/// let config = SummarizerConfig::builder()
///     .model("gpt-4o-mini")
///     .min_tokens(20)
///     .max_tokens(8_000)
///     .merge_policy(MergePolicy::Append)
///     .build()
///     .unwrap();
/// assert_eq!(config.budget.max_tokens, 8_000);
/// ```
#[derive(Clone)]
pub struct SummarizerConfig {
    /// LLM model identifier. Also selects the tokenizer. If None, uses
    /// `EDGEQUAKE_MODEL` or [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed backend. Takes precedence over every provider field.
    pub backend: Option<Arc<dyn SummaryBackend>>,

    /// Token counter. If None, a tiktoken counter for the model is built.
    pub tokenizer: Option<Arc<dyn Tokenizer>>,

    /// Admission thresholds and output cap.
    pub budget: TokenBudget,

    /// Character budget for server-side extracted PDF text. Default: 40 000.
    ///
    /// Roughly four characters per token, matching the default `max_tokens`.
    pub pdf_max_chars: usize,

    /// How OCR text combines with HTML text. Default: [`MergePolicy::PreferOcr`].
    pub merge_policy: MergePolicy,

    /// Per-request backend timeout. If None, derived from `max_output_tokens`.
    pub api_timeout: Option<Duration>,

    /// Download timeout for direct PDF URLs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Stage observer (audit log, progress display). Default: none.
    pub observer: Option<Arc<dyn SummaryObserver>>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            backend: None,
            tokenizer: None,
            budget: TokenBudget::default(),
            pdf_max_chars: 40_000,
            merge_policy: MergePolicy::default(),
            api_timeout: None,
            download_timeout_secs: 120,
            observer: None,
        }
    }
}

impl fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn SummaryBackend>"))
            .field("tokenizer", &self.tokenizer.as_ref().map(|t| t.name().to_string()))
            .field("budget", &self.budget)
            .field("pdf_max_chars", &self.pdf_max_chars)
            .field("merge_policy", &self.merge_policy)
            .field("api_timeout", &self.api_timeout())
            .field("observer", &self.observer.as_ref().map(|_| "<dyn SummaryObserver>"))
            .finish()
    }
}

impl SummarizerConfig {
    /// Create a new builder for `SummarizerConfig`.
    pub fn builder() -> SummarizerConfigBuilder {
        SummarizerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model name requests are issued against.
    pub fn effective_model(&self) -> String {
        if let Some(ref m) = self.model {
            return m.clone();
        }
        match std::env::var("EDGEQUAKE_MODEL") {
            Ok(m) if !m.is_empty() => m,
            _ => DEFAULT_MODEL.to_string(),
        }
    }

    /// Backend timeout: explicit, or 10 s plus one second per 50 output tokens.
    pub fn api_timeout(&self) -> Duration {
        self.api_timeout.unwrap_or_else(|| {
            Duration::from_secs(10 + (self.budget.max_output_tokens as u64) / 50)
        })
    }
}

/// Builder for [`SummarizerConfig`].
pub struct SummarizerConfigBuilder {
    config: SummarizerConfig,
}

impl fmt::Debug for SummarizerConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizerConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl SummarizerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn SummaryBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.config.tokenizer = Some(tokenizer);
        self
    }

    pub fn budget(mut self, budget: TokenBudget) -> Self {
        self.config.budget = budget;
        self
    }

    pub fn min_tokens(mut self, n: usize) -> Self {
        self.config.budget.min_tokens = n;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.budget.max_tokens = n;
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.budget.max_output_tokens = n;
        self
    }

    pub fn pdf_max_chars(mut self, n: usize) -> Self {
        self.config.pdf_max_chars = n;
        self
    }

    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.config.merge_policy = policy;
        self
    }

    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.config.api_timeout = Some(timeout);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout = Some(Duration::from_secs(secs));
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SummaryObserver>) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummarizerConfig, SummaryError> {
        let b = &self.config.budget;
        if b.min_tokens >= b.max_tokens {
            return Err(SummaryError::InvalidConfig(format!(
                "min_tokens ({}) must be below max_tokens ({})",
                b.min_tokens, b.max_tokens
            )));
        }
        if b.max_output_tokens == 0 {
            return Err(SummaryError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if self.config.pdf_max_chars == 0 {
            return Err(SummaryError::InvalidConfig(
                "pdf_max_chars must be ≥ 1".into(),
            ));
        }
        if self.config.api_timeout == Some(Duration::ZERO) {
            return Err(SummaryError::InvalidConfig(
                "api_timeout must be non-zero".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let c = SummarizerConfig::default();
        assert_eq!(c.budget.min_tokens, 50);
        assert_eq!(c.budget.max_tokens, 10_000);
        assert_eq!(c.budget.max_output_tokens, 4096);
        assert_eq!(c.merge_policy, MergePolicy::PreferOcr);
    }

    #[test]
    fn min_must_be_below_max() {
        let err = SummarizerConfig::builder()
            .min_tokens(100)
            .max_tokens(100)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("min_tokens"));
    }

    #[test]
    fn zero_output_cap_rejected() {
        assert!(SummarizerConfig::builder()
            .max_output_tokens(0)
            .build()
            .is_err());
    }

    #[test]
    fn derived_timeout_scales_with_output_cap() {
        let small = SummarizerConfig::builder()
            .max_output_tokens(500)
            .build()
            .unwrap();
        let large = SummarizerConfig::builder()
            .max_output_tokens(5000)
            .build()
            .unwrap();
        assert_eq!(small.api_timeout(), Duration::from_secs(20));
        assert_eq!(large.api_timeout(), Duration::from_secs(110));
    }

    #[test]
    fn explicit_timeout_wins() {
        let c = SummarizerConfig::builder().api_timeout_secs(7).build().unwrap();
        assert_eq!(c.api_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn explicit_model_wins_over_env() {
        let c = SummarizerConfig::builder().model("gpt-4o").build().unwrap();
        assert_eq!(c.effective_model(), "gpt-4o");
    }
}
