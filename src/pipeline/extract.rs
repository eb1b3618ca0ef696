//! Content extractors that turn captured bytes into plain text.
//!
//! These are collaborators, not engine logic: the engine only ever sees their
//! string output. Each sits behind a trait so callers can swap in their own
//! implementation (a readability extractor, a cloud OCR service).
//!
//! None of them fail. A source that cannot be read is logged and contributes
//! an empty string, which the engine later reports as too short or empty.

use crate::error::SourceError;
use crate::pipeline::merge::Attachment;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::io::Write;
use std::process::Command;
use tracing::{debug, warn};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Elements whose text is never page content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

// ── HTML ─────────────────────────────────────────────────────────────────────

/// `(raw_html) -> plain_text`.
pub trait HtmlExtractor: Send + Sync {
    fn extract_text(&self, html: &str) -> String;
}

/// Visible-text extractor built on `scraper`.
///
/// Collects every text node outside script/style-like elements, collapses
/// whitespace inside each node and emits one node per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScraperHtmlExtractor;

impl HtmlExtractor for ScraperHtmlExtractor {
    fn extract_text(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }
        let document = Html::parse_document(html);
        let mut lines: Vec<String> = Vec::new();

        for node in document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
            });
            if hidden {
                continue;
            }
            let cleaned = WHITESPACE_RUN.replace_all(text, " ");
            let cleaned = cleaned.trim();
            if !cleaned.is_empty() {
                lines.push(cleaned.to_string());
            }
        }

        debug!("Extracted {} text nodes from HTML", lines.len());
        lines.join("\n")
    }
}

// ── OCR ──────────────────────────────────────────────────────────────────────

/// `(images) -> recognised_text`; empty on total failure, never errors.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, images: &[Attachment]) -> String;
}

/// OCR disabled: always returns an empty string.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOcr;

#[async_trait]
impl OcrEngine for NoOcr {
    async fn extract_text(&self, _images: &[Attachment]) -> String {
        String::new()
    }
}

/// Tesseract via its command-line binary.
///
/// Each screenshot's text is headed `--- Screenshot N Text ---` (1-indexed)
/// and blocks are joined by a blank line. Screenshots with no text, or on
/// which tesseract fails, are skipped.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    language: String,
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }

    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn extract_text(&self, images: &[Attachment]) -> String {
        if images.is_empty() {
            return String::new();
        }
        let images = images.to_vec();
        let language = self.language.clone();

        let result = tokio::task::spawn_blocking(move || {
            let mut blocks = Vec::new();
            for (i, image) in images.iter().enumerate() {
                let index = i + 1;
                match run_tesseract(image, &language) {
                    Ok(text) if !text.trim().is_empty() => {
                        debug!("Extracted {} characters from screenshot {}", text.trim().len(), index);
                        blocks.push(format_ocr_block(index, &text));
                    }
                    Ok(_) => debug!("No text found in screenshot {}", index),
                    Err(detail) => {
                        warn!("{}", SourceError::OcrFailed { index, detail });
                    }
                }
            }
            blocks.join("\n\n")
        })
        .await;

        result.unwrap_or_else(|e| {
            warn!("OCR task panicked: {}", e);
            String::new()
        })
    }
}

/// `--- Screenshot N Text ---` header followed by the trimmed text.
pub fn format_ocr_block(index: usize, text: &str) -> String {
    format!("--- Screenshot {} Text ---\n{}", index, text.trim())
}

fn run_tesseract(image: &Attachment, language: &str) -> Result<String, String> {
    let suffix = if image.mime_type == "image/jpeg" { ".jpg" } else { ".png" };
    let mut file = tempfile::Builder::new()
        .prefix("screenshot-")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| format!("tempfile: {e}"))?;
    file.write_all(&image.bytes)
        .map_err(|e| format!("tempfile write: {e}"))?;

    let output = Command::new("tesseract")
        .arg(file.path())
        .arg("stdout")
        .args(["-l", language])
        .output();

    match output {
        Ok(o) if o.status.success() => Ok(String::from_utf8_lossy(&o.stdout).to_string()),
        Ok(o) => Err(format!(
            "tesseract failed: {}",
            String::from_utf8_lossy(&o.stderr).trim()
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err("tesseract not found (install tesseract-ocr)".to_string())
        }
        Err(e) => Err(e.to_string()),
    }
}

// ── PDF ──────────────────────────────────────────────────────────────────────

/// `(pdf_bytes) -> plain_text`; empty when the PDF has no text layer.
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    async fn extract_text(&self, pdf: &[u8]) -> String;
}

/// Pure-Rust text-layer extraction with `pdf-extract`, on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtract;

#[async_trait]
impl PdfTextExtractor for PdfExtract {
    async fn extract_text(&self, pdf: &[u8]) -> String {
        if pdf.is_empty() {
            return String::new();
        }
        let bytes = pdf.to_vec();
        let result =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;

        match result {
            Ok(Ok(text)) => {
                debug!("Extracted {} characters from PDF", text.len());
                text
            }
            Ok(Err(e)) => {
                warn!("PDF text extraction failed: {}", e);
                String::new()
            }
            Err(e) => {
                warn!("PDF text extraction panicked: {}", e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_visible_text_only() {
        let html = r#"<html><head><title>T</title><style>p{color:red}</style></head>
            <body><h1>Order   history</h1><script>var x = 1;</script>
            <p>Widget
               $9.99</p><noscript>enable js</noscript></body></html>"#;
        let text = ScraperHtmlExtractor.extract_text(html);
        assert_eq!(text, "Order history\nWidget $9.99");
    }

    #[test]
    fn html_empty_input() {
        assert_eq!(ScraperHtmlExtractor.extract_text("   "), "");
    }

    #[test]
    fn ocr_block_format() {
        assert_eq!(
            format_ocr_block(2, "  hello\n"),
            "--- Screenshot 2 Text ---\nhello"
        );
    }

    #[tokio::test]
    async fn no_ocr_is_empty() {
        let img = Attachment::from_bytes(vec![1, 2, 3]);
        assert_eq!(NoOcr.extract_text(&[img]).await, "");
    }

    #[tokio::test]
    async fn tesseract_with_no_images_is_empty() {
        assert_eq!(TesseractOcr::new().extract_text(&[]).await, "");
    }

    #[tokio::test]
    async fn garbage_pdf_yields_empty_text() {
        assert_eq!(PdfExtract.extract_text(b"not a pdf").await, "");
    }
}
