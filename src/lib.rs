//! # edgequake-summarize
//!
//! Summarise captured browser content (page HTML, screenshots, PDFs,
//! pre-extracted text) with a multimodal LLM.
//!
//! ## Why this crate?
//!
//! A browser capture is messy: the HTML of a single-page app is often empty,
//! screenshots need OCR, PDFs arrive as bytes or as a link. This crate reduces
//! all of that to one text candidate, refuses inputs that are too small or too
//! large before paying for a remote call, picks an instruction tuned to the
//! kind of page (order histories, social feeds, everything else) and returns
//! either a summary or a typed error the caller can map to a status.
//!
//! ## Pipeline Overview
//!
//! ```text
//! CaptureRequest (browser JSON)
//!  │
//!  ├─ 0. Prepare   HTML → text, screenshots → images (+ OCR), PDF → text
//!  ├─ 1. Merge     PDF > extracted text > HTML/OCR by merge policy
//!  ├─ 2. Admit     token budget (50..=10000), or char budget for PDFs
//!  ├─ 3. Classify  URL → instruction template
//!  ├─ 4. Assemble  instruction + text + first screenshot + output cap
//!  └─ 5. Backend   one call, bounded by a timeout, response shape validated
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_summarize::{CaptureInput, ContentSource, Summarizer, SummarizerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let summarizer = Summarizer::new(SummarizerConfig::default())?;
//!     let input = CaptureInput::new("https://example.com/article")
//!         .with_source(ContentSource::HtmlText(std::fs::read_to_string("article.txt")?));
//!     let summary = summarizer.summarize(input).await?;
//!     println!("{}", summary.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `summarize` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-summarize = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capture;
pub mod config;
pub mod error;
pub mod observer;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capture::{CapturePreparer, CaptureRequest};
pub use config::{SummarizerConfig, SummarizerConfigBuilder, TokenBudget, DEFAULT_MODEL};
pub use error::{FailureClass, SourceError, SummaryError};
pub use observer::{NoopObserver, ObserverHandle, SummaryObserver};
pub use output::{Summary, SummaryResult};
pub use pipeline::extract::{
    HtmlExtractor, NoOcr, OcrEngine, PdfExtract, PdfTextExtractor, ScraperHtmlExtractor,
    TesseractOcr,
};
pub use pipeline::input::is_pdf_url;
pub use pipeline::llm::{BackendCallError, BackendResponse, Candidate, EdgequakeBackend, SummaryBackend};
pub use pipeline::merge::{Attachment, ContentSource, MergePolicy};
pub use pipeline::assemble::BackendRequest;
pub use pipeline::tokens::{TiktokenCounter, Tokenizer};
pub use prompts::{classify, select_prompt, SelectedPrompt, TemplateKind};
pub use summarize::{CaptureInput, Summarizer};
