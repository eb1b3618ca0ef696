//! Observer trait for per-stage summarization events.
//!
//! Inject an [`Arc<dyn SummaryObserver>`] via
//! [`crate::config::SummarizerConfigBuilder::observer`] to see what the engine
//! did with a request: which sources arrived, how many tokens were admitted,
//! which template was chosen, what came back. The CLI uses this to write an
//! audit log directory; a server could forward events to its own tracing or a
//! database instead. The engine itself never touches the filesystem.
//!
//! # Example
//!
//! ```rust
//! use edgequake_summarize::{SummaryObserver, SummarizerConfig, TemplateKind};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct TemplateRecorder {
//!     seen: Mutex<Vec<TemplateKind>>,
//! }
//!
//! impl SummaryObserver for TemplateRecorder {
//!     fn on_prompt_selected(&self, kind: TemplateKind, _instruction: &str) {
//!         self.seen.lock().unwrap().push(kind);
//!     }
//! }
//!
//! let config = SummarizerConfig::builder()
//!     .observer(Arc::new(TemplateRecorder::default()) as Arc<dyn SummaryObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::SummaryError;
use crate::output::Summary;
use crate::pipeline::merge::ContentSource;
use crate::prompts::TemplateKind;
use std::sync::Arc;

/// Called by the engine as a request moves through the pipeline.
///
/// Implementations must be `Send + Sync`: concurrent requests share one
/// observer. Every method has a no-op default.
pub trait SummaryObserver: Send + Sync {
    /// A request arrived for `page_url` (may be empty).
    fn on_request(&self, page_url: &str) {
        let _ = page_url;
    }

    /// One captured source, before merging.
    fn on_source(&self, source: &ContentSource) {
        let _ = source;
    }

    /// The merged text passed admission.
    ///
    /// `size` is a token count on token-admitted paths and a character count
    /// on the PDF path; `truncated` is only ever true on the PDF path.
    fn on_admitted(&self, path: &str, size: usize, truncated: bool) {
        let _ = (path, size, truncated);
    }

    /// The instruction that will be sent as the system message.
    fn on_prompt_selected(&self, kind: TemplateKind, instruction: &str) {
        let _ = (kind, instruction);
    }

    /// The backend produced a summary.
    fn on_summary(&self, page_url: &str, summary: &Summary) {
        let _ = (page_url, summary);
    }

    /// The request failed; `error` is what the caller receives.
    fn on_failure(&self, page_url: &str, error: &SummaryError) {
        let _ = (page_url, error);
    }
}

/// Observer that ignores every event. Used when none is configured.
pub struct NoopObserver;

impl SummaryObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::SummarizerConfig`].
pub type ObserverHandle = Arc<dyn SummaryObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        sources: AtomicUsize,
        failures: AtomicUsize,
    }

    impl SummaryObserver for Counting {
        fn on_source(&self, _source: &ContentSource) {
            self.sources.fetch_add(1, Ordering::SeqCst);
        }

        fn on_failure(&self, _page_url: &str, _error: &SummaryError) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_request("https://example.com");
        o.on_source(&ContentSource::HtmlText("x".into()));
        o.on_admitted("page", 120, false);
        o.on_prompt_selected(TemplateKind::Generic, "Summarize");
        o.on_failure("", &SummaryError::NoContentProvided);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let o = Counting::default();
        o.on_source(&ContentSource::HtmlText("a".into()));
        o.on_source(&ContentSource::OcrText("b".into()));
        o.on_failure("u", &SummaryError::Cancelled);
        o.on_request("u");
        assert_eq!(o.sources.load(Ordering::SeqCst), 2);
        assert_eq!(o.failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let o: ObserverHandle = Arc::new(NoopObserver);
        o.on_admitted("pdf", 40_000, true);
    }
}
