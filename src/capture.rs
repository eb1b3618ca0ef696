//! Browser capture wire shape and its conversion into engine input.
//!
//! Browser clients POST a JSON body like:
//!
//! ```json
//! {
//!   "pageUrl": "https://www.amazon.com/gp/your-account/order-history",
//!   "html": "<html>...</html>",
//!   "screenshot": ["data:image/png;base64,iVBOR..."],
//!   "isPdf": false,
//!   "additionalInstructions": "Use a table"
//! }
//! ```
//!
//! [`CapturePreparer`] runs the content collaborators over it (HTML text
//! extraction, screenshot decoding, OCR, PDF text extraction) and produces a
//! [`CaptureInput`] for [`crate::Summarizer`].

use crate::error::SummaryError;
use crate::pipeline::extract::{
    HtmlExtractor, NoOcr, OcrEngine, PdfExtract, PdfTextExtractor, ScraperHtmlExtractor,
};
use crate::pipeline::input::{download_pdf, is_pdf_url, is_url, materialize_screenshots};
use crate::pipeline::merge::ContentSource;
use crate::summarize::CaptureInput;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One capture as sent by a browser client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureRequest {
    pub page_url: String,
    pub html: String,
    /// Screenshot data URLs in capture order.
    pub screenshot: Vec<String>,
    pub is_pdf: bool,
    /// Base64 PDF bytes, optionally with a `data:application/pdf;base64,` prefix.
    pub pdf_data: Option<String>,
    /// URL the server should fetch the PDF from itself.
    pub direct_pdf_url: Option<String>,
    /// Text the client already extracted (e.g. from a PDF viewer).
    pub extracted_text: Option<String>,
    pub additional_instructions: Option<String>,
}

/// Turns a [`CaptureRequest`] into a [`CaptureInput`].
#[derive(Clone)]
pub struct CapturePreparer {
    html: Arc<dyn HtmlExtractor>,
    ocr: Arc<dyn OcrEngine>,
    pdf: Arc<dyn PdfTextExtractor>,
    download_timeout_secs: u64,
}

impl Default for CapturePreparer {
    fn default() -> Self {
        Self {
            html: Arc::new(ScraperHtmlExtractor),
            ocr: Arc::new(NoOcr),
            pdf: Arc::new(PdfExtract),
            download_timeout_secs: 120,
        }
    }
}

impl CapturePreparer {
    /// Scraper HTML extraction, pdf-extract for PDFs, OCR disabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_html_extractor(mut self, html: Arc<dyn HtmlExtractor>) -> Self {
        self.html = html;
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_pdf_extractor(mut self, pdf: Arc<dyn PdfTextExtractor>) -> Self {
        self.pdf = pdf;
        self
    }

    pub fn with_download_timeout_secs(mut self, secs: u64) -> Self {
        self.download_timeout_secs = secs;
        self
    }

    /// Run the collaborators over `request`.
    ///
    /// Only a failed PDF download is an error. Undecodable screenshots are
    /// dropped. Unreadable PDF data, or a PDF capture with nothing to read
    /// and no client-extracted text, becomes an empty PDF source so the
    /// engine reports it as [`SummaryError::ExtractionEmpty`].
    pub async fn prepare(&self, request: &CaptureRequest) -> Result<CaptureInput, SummaryError> {
        info!("Preparing capture for: {}", display_url(&request.page_url));
        let mut input = CaptureInput::new(request.page_url.trim());
        input.additional_instructions = request
            .additional_instructions
            .as_ref()
            .filter(|s| !s.trim().is_empty())
            .cloned();

        // PDF bytes, uploaded or fetched.
        let is_pdf = request.is_pdf || request.direct_pdf_url.is_some();
        if is_pdf {
            match self.pdf_bytes(request).await? {
                Some(bytes) => {
                    let text = self.pdf.extract_text(&bytes).await;
                    debug!("PDF text: {} chars", text.chars().count());
                    input.sources.push(ContentSource::PdfText(text));
                }
                None if request.extracted_text.is_some() => {
                    debug!("PDF capture without bytes, using client-extracted text");
                }
                None => {
                    warn!("Capture flagged as PDF but carried no PDF data");
                    input.sources.push(ContentSource::PdfText(String::new()));
                }
            }
        }

        if let Some(ref text) = request.extracted_text {
            input.sources.push(ContentSource::ExtractedText(text.clone()));
        }

        if !request.html.trim().is_empty() {
            let text = self.html.extract_text(&request.html);
            debug!("HTML text: {} chars", text.len());
            input.sources.push(ContentSource::HtmlText(text));
        }

        let (images, _dropped) = materialize_screenshots(&request.screenshot);

        // OCR is only worth running when the page path can still win.
        let page_path = !input.sources.iter().any(|s| {
            matches!(s, ContentSource::PdfText(_) | ContentSource::ExtractedText(_))
        });
        if page_path && !images.is_empty() {
            let text = self.ocr.extract_text(&images).await;
            if !text.trim().is_empty() {
                debug!("OCR text: {} chars", text.len());
                input.sources.push(ContentSource::OcrText(text));
            }
        }
        input.images = images;

        Ok(input)
    }

    async fn pdf_bytes(&self, request: &CaptureRequest) -> Result<Option<Vec<u8>>, SummaryError> {
        if let Some(ref data) = request.pdf_data {
            let payload = data
                .split_once(";base64,")
                .map(|(_, p)| p)
                .unwrap_or(data.as_str())
                .trim();
            return match STANDARD.decode(payload) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) => {
                    warn!("PDF data is not valid base64: {}", e);
                    Ok(Some(Vec::new()))
                }
            };
        }
        if let Some(ref url) = request.direct_pdf_url {
            return download_pdf(url, self.download_timeout_secs).await.map(Some);
        }
        // The page itself may be the PDF (viewer tab on a .pdf URL).
        let page_url = request.page_url.trim();
        if is_url(page_url) && is_pdf_url(page_url) {
            return download_pdf(page_url, self.download_timeout_secs)
                .await
                .map(Some);
        }
        Ok(None)
    }
}

fn display_url(url: &str) -> &str {
    if url.is_empty() {
        "<no url>"
    } else {
        url
    }
}
