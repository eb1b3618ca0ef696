//! Error types for the edgequake-summarize library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SummaryError`] is **fatal** for the request: no summary can be
//!   produced (no content, input outside the token budget, backend down).
//!   Every public entry point returns it as a value; nothing is raised
//!   past the engine boundary.
//!
//! * [`SourceError`] is **non-fatal**: one captured source failed to decode
//!   (a corrupt screenshot, an OCR crash on one image). It is logged and the
//!   source is dropped before it ever reaches the merger.
//!
//! [`SummaryError::class`] lets the calling layer pick a status without
//! matching every variant: client-input failures are the caller's to fix,
//! backend failures are not.

use thiserror::Error;

/// Coarse classification of a [`SummaryError`] for the calling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The request itself is unusable (nothing to summarise, out of budget).
    Client,
    /// The remote backend could not produce a summary.
    Backend,
    /// Configuration or an internal fault.
    Internal,
}

/// All fatal errors returned by the summarization engine.
#[derive(Debug, Error)]
pub enum SummaryError {
    // ── Client input ──────────────────────────────────────────────────────
    /// Neither a page URL nor any content source was supplied.
    #[error("No URL or content provided for summarization")]
    NoContentProvided,

    /// Merged text is below the admission threshold.
    #[error("Input text is too short to summarize ({tokens}/{min} tokens)")]
    TooShort { tokens: usize, min: usize },

    /// Merged text exceeds the admission threshold.
    #[error("Input text exceeds token limit ({tokens}/{max} tokens)")]
    TooLong { tokens: usize, max: usize },

    /// A PDF or pre-extracted text path yielded no usable text.
    #[error("No usable text could be extracted from the {source_kind}")]
    ExtractionEmpty { source_kind: String },

    /// A direct PDF URL could not be fetched.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── Backend ───────────────────────────────────────────────────────────
    /// Network or transport failure reaching the backend, including timeouts.
    #[error("Summarization backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    /// The backend answered, but not in the expected shape.
    #[error("Summarization backend returned a malformed response: {detail}")]
    BackendProtocolError { detail: String },

    /// The backend explicitly returned no usable content.
    #[error("Summarization backend refused to summarize: {reason}")]
    BackendRefused { reason: String },

    /// The caller cancelled the request before the backend answered.
    #[error("Summarization cancelled before the backend responded")]
    Cancelled,

    // ── Config / internal ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SummaryError {
    /// Which side of the boundary is responsible for this failure.
    pub fn class(&self) -> FailureClass {
        match self {
            SummaryError::NoContentProvided
            | SummaryError::TooShort { .. }
            | SummaryError::TooLong { .. }
            | SummaryError::ExtractionEmpty { .. }
            | SummaryError::DownloadFailed { .. }
            | SummaryError::Cancelled => FailureClass::Client,
            SummaryError::BackendUnavailable { .. }
            | SummaryError::BackendProtocolError { .. }
            | SummaryError::BackendRefused { .. } => FailureClass::Backend,
            SummaryError::ProviderNotConfigured { .. }
            | SummaryError::InvalidConfig(_)
            | SummaryError::Internal(_) => FailureClass::Internal,
        }
    }

    /// HTTP-style status code for the failure, for handlers that speak HTTP.
    pub fn status_code(&self) -> u16 {
        match self.class() {
            FailureClass::Client => 400,
            FailureClass::Backend => 502,
            FailureClass::Internal => 500,
        }
    }
}

/// A non-fatal error for a single captured source.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SourceError {
    /// A screenshot data URL was not a base64 image.
    #[error("Screenshot {index}: invalid data URL: {detail}")]
    InvalidDataUrl { index: usize, detail: String },

    /// Screenshot bytes did not decode as an image.
    #[error("Screenshot {index}: image decode failed: {detail}")]
    UndecodableImage { index: usize, detail: String },

    /// OCR failed on one screenshot.
    #[error("Screenshot {index}: OCR failed: {detail}")]
    OcrFailed { index: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_short_display_carries_count_and_threshold() {
        let e = SummaryError::TooShort { tokens: 49, min: 50 };
        let msg = e.to_string();
        assert!(msg.contains("49/50"), "got: {msg}");
    }

    #[test]
    fn too_long_display_carries_count_and_threshold() {
        let e = SummaryError::TooLong {
            tokens: 12000,
            max: 10000,
        };
        assert!(e.to_string().contains("12000/10000"));
    }

    #[test]
    fn classification() {
        assert_eq!(SummaryError::NoContentProvided.class(), FailureClass::Client);
        assert_eq!(SummaryError::NoContentProvided.status_code(), 400);
        let e = SummaryError::BackendProtocolError {
            detail: "no candidates".into(),
        };
        assert_eq!(e.class(), FailureClass::Backend);
        assert_eq!(e.status_code(), 502);
        assert_eq!(SummaryError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn extraction_empty_names_source() {
        let e = SummaryError::ExtractionEmpty {
            source_kind: "PDF".into(),
        };
        assert!(e.to_string().contains("PDF"));
    }

    #[test]
    fn source_error_display() {
        let e = SourceError::UndecodableImage {
            index: 2,
            detail: "bad png".into(),
        };
        assert!(e.to_string().contains("Screenshot 2"));
    }
}
