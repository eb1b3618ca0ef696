//! Admission control: decide whether a text candidate is worth a backend call.
//!
//! Two rules, deliberately kept apart:
//!
//! * [`admit`] is the token rule for page and extracted-text paths. Out of
//!   budget means rejection, never truncation.
//! * [`admit_pdf_text`] is the PDF rule. PDFs are assumed pre-filtered by the
//!   caller, so the budget is a raw character count and oversized text is
//!   hard-truncated instead of rejected.
//!
//! Both run before the backend is touched.

use crate::config::TokenBudget;
use crate::error::SummaryError;
use crate::pipeline::tokens::Tokenizer;
use tracing::{debug, info};

/// Outcome of the token rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admitted {
    pub tokens: usize,
}

/// Outcome of the PDF character rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedPdf {
    pub text: String,
    pub original_chars: usize,
    pub truncated: bool,
}

/// Token rule: reject when `n > max_tokens` or `n < min_tokens`.
pub fn admit(
    text: &str,
    budget: &TokenBudget,
    tokenizer: &dyn Tokenizer,
) -> Result<Admitted, SummaryError> {
    let tokens = tokenizer.count_tokens(text);
    debug!("Token count for input text: {} ({})", tokens, tokenizer.name());

    if tokens > budget.max_tokens {
        info!("Input text exceeds token limit ({}/{})", tokens, budget.max_tokens);
        return Err(SummaryError::TooLong {
            tokens,
            max: budget.max_tokens,
        });
    }
    if tokens < budget.min_tokens {
        info!("Input text too short ({}/{})", tokens, budget.min_tokens);
        return Err(SummaryError::TooShort {
            tokens,
            min: budget.min_tokens,
        });
    }
    Ok(Admitted { tokens })
}

/// PDF rule: empty text fails, oversized text is cut to `max_chars` characters.
pub fn admit_pdf_text(text: &str, max_chars: usize) -> Result<AdmittedPdf, SummaryError> {
    if text.trim().is_empty() {
        return Err(SummaryError::ExtractionEmpty {
            source_kind: "PDF".into(),
        });
    }

    let original_chars = text.chars().count();
    if original_chars <= max_chars {
        return Ok(AdmittedPdf {
            text: text.to_string(),
            original_chars,
            truncated: false,
        });
    }

    info!(
        "PDF text truncated from {} to {} characters",
        original_chars, max_chars
    );
    Ok(AdmittedPdf {
        text: text.chars().take(max_chars).collect(),
        original_chars,
        truncated: true,
    })
}
