//! Pipeline stages for one summarization request.
//!
//! Each submodule implements one step. The engine in [`crate::summarize`]
//! strings them together; everything here is usable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input/extract ──▶ merge ──▶ admission ──▶ assemble ──▶ encode ──▶ llm
//!  (collaborators)  (sources)  (tokens)     (request)    (base64)   (backend)
//! ```
//!
//! 1. [`input`], [`extract`]: decode screenshots, fetch PDFs, HTML/OCR/PDF
//!    text extraction; failures drop a source, never the request
//! 2. [`merge`]: pick the content path and representative image
//! 3. [`admission`]: token budget via [`tokens`], or character budget for PDFs
//! 4. [`assemble`]: instruction + text + image + output cap
//! 5. [`encode`]: base64 the attachment into `ImageData`
//! 6. [`llm`]: the only stage with network I/O; validates the response shape

pub mod admission;
pub mod assemble;
pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod merge;
pub mod tokens;
