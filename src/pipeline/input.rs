//! Input materialisation: screenshot data URLs and direct PDF URLs to bytes.
//!
//! Browsers hand screenshots over as `data:image/png;base64,...` strings and
//! PDFs either as base64 bytes or as a URL the server should fetch itself.
//! This module turns both into raw bytes. Screenshots that fail to decode are
//! dropped with a [`SourceError`] so one corrupt capture never sinks the
//! whole request.

use crate::error::{SourceError, SummaryError};
use crate::pipeline::merge::Attachment;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

static ARXIV_STYLE_PDF: Lazy<Regex> = Lazy::new(|| Regex::new(r"/pdf/\d+").unwrap());

/// Check if the input string looks like an HTTP(S) URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Heuristic used by browser clients to route a tab to the PDF path.
pub fn is_pdf_url(url: &str) -> bool {
    url.contains("/pdf/")
        || url.ends_with(".pdf")
        || url.contains("pdf?")
        || url.contains("filetype=pdf")
        || ARXIV_STYLE_PDF.is_match(url)
        || url.starts_with("blob:")
}

/// Decode screenshot data URLs into images, dropping entries that fail.
///
/// Returns the decoded images in submission order plus one [`SourceError`]
/// per dropped entry (1-indexed).
pub fn materialize_screenshots(data_urls: &[String]) -> (Vec<Attachment>, Vec<SourceError>) {
    let mut images = Vec::with_capacity(data_urls.len());
    let mut errors = Vec::new();

    for (i, data_url) in data_urls.iter().enumerate() {
        let index = i + 1;
        let bytes = match decode_data_url(data_url) {
            Ok(b) => b,
            Err(detail) => {
                errors.push(SourceError::InvalidDataUrl { index, detail });
                continue;
            }
        };
        if let Err(e) = image::load_from_memory(&bytes) {
            errors.push(SourceError::UndecodableImage {
                index,
                detail: e.to_string(),
            });
            continue;
        }
        debug!("Screenshot {} decoded ({} bytes)", index, bytes.len());
        images.push(Attachment::from_bytes(bytes));
    }

    for e in &errors {
        warn!("{}", e);
    }
    info!(
        "Received {} screenshot(s), {} usable",
        data_urls.len(),
        images.len()
    );
    (images, errors)
}

/// Split `data:image/<type>;base64,<payload>` and decode the payload.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, String> {
    let rest = data_url
        .strip_prefix("data:image/")
        .ok_or_else(|| "expected a data:image/ URL".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "missing ',' separator".to_string())?;
    if !header.ends_with(";base64") {
        return Err(format!("unsupported encoding in 'data:image/{header}'"));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("base64: {e}"))
}

/// Fetch a PDF the client pointed at instead of uploading.
pub async fn download_pdf(url: &str, timeout_secs: u64) -> Result<Vec<u8>, SummaryError> {
    info!("Downloading PDF from: {}", url);
    let failed = |reason: String| SummaryError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    if !is_url(url) {
        return Err(failed("not an HTTP/HTTPS URL".into()));
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    if !bytes.starts_with(b"%PDF") {
        return Err(failed("response is not a PDF".into()));
    }

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_data_url() -> String {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(buf))
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn pdf_url_heuristics() {
        assert!(is_pdf_url("https://arxiv.org/pdf/1706.03762"));
        assert!(is_pdf_url("https://example.com/paper.pdf"));
        assert!(is_pdf_url("https://example.com/get?filetype=pdf"));
        assert!(is_pdf_url("blob:https://example.com/uuid"));
        assert!(!is_pdf_url("https://example.com/article"));
    }

    #[test]
    fn decodes_valid_screenshots_and_drops_bad_ones() {
        let urls = vec![
            png_data_url(),
            "data:image/png;base64,!!!not-base64!!!".to_string(),
            "https://example.com/shot.png".to_string(),
            format!("data:image/png;base64,{}", STANDARD.encode(b"not an image")),
            png_data_url(),
        ];
        let (images, errors) = materialize_screenshots(&urls);
        assert_eq!(images.len(), 2);
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], SourceError::InvalidDataUrl { index: 2, .. }));
        assert!(matches!(errors[2], SourceError::UndecodableImage { index: 4, .. }));
        assert!(images.iter().all(|i| i.mime_type == "image/png"));
    }

    #[test]
    fn empty_list_is_empty() {
        let (images, errors) = materialize_screenshots(&[]);
        assert!(images.is_empty() && errors.is_empty());
    }

    #[test]
    fn rejects_non_base64_data_url() {
        assert!(decode_data_url("data:image/svg+xml;utf8,<svg/>").is_err());
    }

    #[tokio::test]
    async fn download_rejects_non_http() {
        let err = download_pdf("file:///tmp/a.pdf", 5).await.unwrap_err();
        assert!(matches!(err, SummaryError::DownloadFailed { .. }));
    }
}
