//! Source merging: many captured sources in, one text candidate out.
//!
//! A capture can carry HTML-derived text, OCR text from screenshots,
//! text the browser already pulled out of a PDF viewer, and text extracted
//! server-side from PDF bytes. Exactly one *content path* is active per
//! request, chosen by a fixed priority:
//!
//! ```text
//! PdfText  >  ExtractedText  >  HtmlText / OcrText (merged by MergePolicy)
//! ```
//!
//! The merger never fails. Sources that could not be decoded were already
//! dropped by the collaborators in [`crate::pipeline::extract`].

use serde::{Deserialize, Serialize};

/// One captured text source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentSource {
    /// Plain text derived from the page HTML.
    HtmlText(String),
    /// Text recognised in page screenshots.
    OcrText(String),
    /// Text the client extracted itself (e.g. from a PDF viewer's text layer).
    ExtractedText(String),
    /// Text extracted from PDF bytes.
    PdfText(String),
}

/// How OCR text and HTML text combine on the page path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Non-empty OCR text replaces the HTML text entirely. (default)
    #[default]
    PreferOcr,
    /// HTML text, a blank line, then OCR text.
    Append,
}

/// A single image sent alongside the text.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Attachment {
    /// Wrap raw image bytes, sniffing the MIME type from the magic bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime_type = image::guess_format(&bytes)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| "image/png".to_string());
        Self { bytes, mime_type }
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Which content path a capture resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPath {
    /// PDF bytes were extracted server-side; admitted by character budget.
    Pdf(String),
    /// Client-extracted text; admitted by token budget.
    Extracted(String),
    /// HTML and/or OCR text merged by policy; admitted by token budget.
    Page(String),
}

impl ContentPath {
    pub fn text(&self) -> &str {
        match self {
            ContentPath::Pdf(t) | ContentPath::Extracted(t) | ContentPath::Page(t) => t,
        }
    }

    /// Short label used in logs and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ContentPath::Pdf(_) => "PDF",
            ContentPath::Extracted(_) => "extracted text",
            ContentPath::Page(_) => "page",
        }
    }
}

/// The merged text candidate plus the representative image.
#[derive(Debug, Clone)]
pub struct MergedContent {
    pub path: ContentPath,
    pub attachment: Option<Attachment>,
}

/// What the engine sends through admission, classification and assembly.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// Non-empty once the request has passed admission.
    pub merged_text: String,
    pub source_url: String,
    pub attachment: Option<Attachment>,
    pub additional_instructions: Option<String>,
}

/// Resolve the active content path and representative image.
pub fn merge_sources(
    sources: &[ContentSource],
    images: &[Attachment],
    policy: MergePolicy,
) -> MergedContent {
    let pdf = join_kind(sources, |s| match s {
        ContentSource::PdfText(t) => Some(t),
        _ => None,
    });
    let extracted = join_kind(sources, |s| match s {
        ContentSource::ExtractedText(t) => Some(t),
        _ => None,
    });

    let path = if let Some(text) = pdf {
        ContentPath::Pdf(text)
    } else if let Some(text) = extracted {
        ContentPath::Extracted(text)
    } else {
        let html = join_kind(sources, |s| match s {
            ContentSource::HtmlText(t) => Some(t),
            _ => None,
        })
        .unwrap_or_default();
        let ocr = join_kind(sources, |s| match s {
            ContentSource::OcrText(t) => Some(t),
            _ => None,
        })
        .unwrap_or_default();
        ContentPath::Page(merge_page_text(&html, &ocr, policy))
    };

    MergedContent {
        path,
        attachment: representative_image(images),
    }
}

/// Combine HTML and OCR text under `policy`.
pub fn merge_page_text(html: &str, ocr: &str, policy: MergePolicy) -> String {
    if ocr.trim().is_empty() {
        return html.to_string();
    }
    match policy {
        MergePolicy::PreferOcr => ocr.to_string(),
        MergePolicy::Append if html.trim().is_empty() => ocr.to_string(),
        MergePolicy::Append => format!("{html}\n\n{ocr}"),
    }
}

/// The first image in submission order; later images are ignored.
pub fn representative_image(images: &[Attachment]) -> Option<Attachment> {
    images.first().cloned()
}

/// Join all sources of one kind. `None` when the kind is absent, so a present
/// but empty source still selects its path (and later fails as empty).
fn join_kind<'a>(
    sources: &'a [ContentSource],
    pick: impl Fn(&'a ContentSource) -> Option<&'a String>,
) -> Option<String> {
    let parts: Vec<&str> = sources.iter().filter_map(&pick).map(String::as_str).collect();
    if parts.is_empty() {
        None
    } else {
        Some(
            parts
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(marker: u8) -> Attachment {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.push(marker);
        Attachment::from_bytes(bytes)
    }

    #[test]
    fn prefer_ocr_replaces_html() {
        assert_eq!(merge_page_text("html", "ocr", MergePolicy::PreferOcr), "ocr");
    }

    #[test]
    fn append_puts_ocr_after_html() {
        assert_eq!(
            merge_page_text("html", "ocr", MergePolicy::Append),
            "html\n\nocr"
        );
    }

    #[test]
    fn empty_ocr_keeps_html_under_both_policies() {
        for policy in [MergePolicy::PreferOcr, MergePolicy::Append] {
            assert_eq!(merge_page_text("html", "  ", policy), "html");
        }
    }

    #[test]
    fn append_without_html_is_just_ocr() {
        assert_eq!(merge_page_text("", "ocr", MergePolicy::Append), "ocr");
    }

    #[test]
    fn pdf_text_wins_over_everything() {
        let sources = vec![
            ContentSource::HtmlText("html".into()),
            ContentSource::ExtractedText("extracted".into()),
            ContentSource::PdfText("pdf".into()),
        ];
        let merged = merge_sources(&sources, &[], MergePolicy::default());
        assert_eq!(merged.path, ContentPath::Pdf("pdf".into()));
    }

    #[test]
    fn extracted_text_wins_over_page_sources() {
        let sources = vec![
            ContentSource::OcrText("ocr".into()),
            ContentSource::ExtractedText("extracted".into()),
        ];
        let merged = merge_sources(&sources, &[], MergePolicy::default());
        assert_eq!(merged.path, ContentPath::Extracted("extracted".into()));
    }

    #[test]
    fn present_but_empty_pdf_still_selects_pdf_path() {
        let sources = vec![
            ContentSource::HtmlText("html".into()),
            ContentSource::PdfText("   ".into()),
        ];
        let merged = merge_sources(&sources, &[], MergePolicy::default());
        assert_eq!(merged.path.label(), "PDF");
        assert!(merged.path.text().is_empty());
    }

    #[test]
    fn first_image_is_representative() {
        let images = vec![png(1), png(2), png(3)];
        let merged = merge_sources(&[], &images, MergePolicy::default());
        assert_eq!(merged.attachment, Some(png(1)));
    }

    #[test]
    fn no_images_no_attachment() {
        let merged = merge_sources(&[], &[], MergePolicy::default());
        assert!(merged.attachment.is_none());
        assert_eq!(merged.path, ContentPath::Page(String::new()));
    }

    #[test]
    fn mime_is_sniffed() {
        assert_eq!(png(0).mime_type, "image/png");
        let jpeg = Attachment::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0]);
        assert_eq!(jpeg.mime_type, "image/jpeg");
    }
}
