//! Success value returned by the engine.

use crate::prompts::TemplateKind;
use serde::{Deserialize, Serialize};

/// A generated summary plus how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Backend content, trimmed and otherwise verbatim. Never empty.
    pub text: String,
    /// Template the source URL was classified as.
    pub template: TemplateKind,
    /// Content path that was summarised: "page", "extracted text" or "PDF".
    pub content_path: String,
    /// Admitted size: tokens on token-budgeted paths, characters on the PDF path.
    pub admitted_size: usize,
    /// True when PDF text was cut to the character budget.
    pub truncated: bool,
    /// Whether an image was sent with the text.
    pub with_image: bool,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
}

/// What the calling layer receives for each request.
pub type SummaryResult = Result<Summary, crate::error::SummaryError>;
