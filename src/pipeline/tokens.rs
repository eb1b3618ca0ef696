//! Token counting in the backend's own units.
//!
//! The admission thresholds in [`crate::config::TokenBudget`] are expressed in
//! the tokenizer units the backend bills and limits in, so the counter must
//! be built from the same model identifier the backend is called with.
//! OpenAI-family models use tiktoken BPEs; unknown model names fall back to
//! `cl100k_base`, which is close enough for admission purposes.

use crate::error::SummaryError;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Pure token-counting function. Empty text counts as zero tokens.
pub trait Tokenizer: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;

    /// Human-readable name, used in logs.
    fn name(&self) -> &str;
}

/// tiktoken-backed counter for a fixed model.
pub struct TiktokenCounter {
    bpe: CoreBPE,
    model: String,
}

impl TiktokenCounter {
    /// Build the counter for `model`, falling back to `cl100k_base`.
    pub fn for_model(model: &str) -> Result<Self, SummaryError> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .or_else(|_| {
                debug!("No tiktoken encoding registered for '{}', using cl100k_base", model);
                tiktoken_rs::cl100k_base()
            })
            .map_err(|e| SummaryError::InvalidConfig(format!("tokenizer init failed: {e}")))?;
        Ok(Self {
            bpe,
            model: model.to_string(),
        })
    }
}

impl Tokenizer for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero() {
        let t = TiktokenCounter::for_model("gpt-3.5-turbo").unwrap();
        assert_eq!(t.count_tokens(""), 0);
    }

    #[test]
    fn short_sentence_counts_a_few_tokens() {
        let t = TiktokenCounter::for_model("gpt-3.5-turbo").unwrap();
        let n = t.count_tokens("Hello, world!");
        assert!(n > 0 && n < 10, "got {n}");
    }

    #[test]
    fn deterministic_for_fixed_model() {
        let t = TiktokenCounter::for_model("gpt-4o").unwrap();
        let text = "Order #1 $9.99 Recommended: Widget";
        assert_eq!(t.count_tokens(text), t.count_tokens(text));
    }

    #[test]
    fn special_token_text_is_counted_as_ordinary_text() {
        let t = TiktokenCounter::for_model("gpt-4o").unwrap();
        assert!(t.count_tokens("<|endoftext|>") > 1);
    }

    #[test]
    fn unknown_model_falls_back() {
        let t = TiktokenCounter::for_model("some-local-llava").unwrap();
        assert_eq!(t.name(), "some-local-llava");
        assert!(t.count_tokens("fallback encodings still count") > 0);
    }
}
