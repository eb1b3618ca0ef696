//! CLI binary for edgequake-summarize.
//!
//! A thin shim over the library crate that maps CLI flags (or a browser
//! capture JSON file) to a `CaptureRequest`, runs it and prints the summary.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;
use edgequake_summarize::pipeline::input::is_url;
use edgequake_summarize::{
    CapturePreparer, CaptureRequest, ContentSource, FailureClass, MergePolicy, NoOcr, OcrEngine,
    Summarizer, SummarizerConfig, Summary, SummaryError, SummaryObserver, TemplateKind,
    TesseractOcr,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI observer: spinner + audit directory ──────────────────────────────────

/// Drives the spinner and, with `--audit-dir`, writes one log file per
/// pipeline artefact (`page_url.log`, `html_text.log`, `ocr_text.log`,
/// `pdf_text.log`, `extracted_text.log`, `prompt.log`, `summary.log`,
/// `error.log`). Files are overwritten on each run.
struct CliObserver {
    bar: Option<ProgressBar>,
    audit_dir: Option<PathBuf>,
}

impl CliObserver {
    fn new(show_progress: bool, audit_dir: Option<PathBuf>) -> Result<Arc<Self>> {
        if let Some(ref dir) = audit_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create audit directory {:?}", dir))?;
        }

        let bar = show_progress.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_prefix("Summarizing");
            bar.set_message("Preparing capture…");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });

        Ok(Arc::new(Self { bar, audit_dir }))
    }

    fn message(&self, msg: String) {
        if let Some(ref bar) = self.bar {
            bar.set_message(msg);
        }
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }

    fn audit(&self, file: &str, contents: &str) {
        let Some(ref dir) = self.audit_dir else {
            return;
        };
        let path = dir.join(file);
        if let Err(e) = std::fs::write(&path, contents) {
            warn!("Failed to write audit log {:?}: {}", path, e);
        }
    }
}

impl SummaryObserver for CliObserver {
    fn on_request(&self, page_url: &str) {
        self.message("Merging sources…".to_string());
        self.audit("page_url.log", page_url);
    }

    fn on_source(&self, source: &ContentSource) {
        match source {
            ContentSource::HtmlText(t) => self.audit("html_text.log", t),
            ContentSource::OcrText(t) => self.audit("ocr_text.log", t),
            ContentSource::ExtractedText(t) => self.audit("extracted_text.log", t),
            ContentSource::PdfText(t) => self.audit("pdf_text.log", t),
        }
    }

    fn on_admitted(&self, path: &str, size: usize, truncated: bool) {
        let unit = if path == "PDF" { "chars" } else { "tokens" };
        let note = if truncated { ", truncated" } else { "" };
        self.message(format!("{path}: {size} {unit}{note}"));
    }

    fn on_prompt_selected(&self, kind: TemplateKind, instruction: &str) {
        self.message(format!("Waiting for backend ({kind})…"));
        self.audit("prompt.log", instruction);
    }

    fn on_summary(&self, _page_url: &str, summary: &Summary) {
        self.finish();
        self.audit("summary.log", &summary.text);
    }

    fn on_failure(&self, _page_url: &str, error: &SummaryError) {
        self.finish();
        self.audit("error.log", &error.to_string());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise a saved browser capture
  summarize --capture capture.json

  # Page text plus a screenshot, with OCR
  summarize --url https://example.com/post --html page.html --screenshot shot.png --ocr

  # A PDF, local or remote
  summarize --pdf paper.pdf
  summarize --pdf https://arxiv.org/pdf/1706.03762

  # Extra instructions and a specific model
  summarize --url https://example.com --text article.txt --instructions "Use bullet points" \
            --model gpt-4.1-mini --provider openai

  # Keep every intermediate artefact for inspection
  summarize --capture capture.json --audit-dir logs/

  # JSON output (Summary struct)
  summarize --capture capture.json --json > summary.json

CAPTURE FILE FORMAT (camelCase JSON):
  { "pageUrl": "...", "html": "...", "screenshot": ["data:image/png;base64,..."],
    "isPdf": false, "pdfData": null, "directPdfUrl": null,
    "extractedText": null, "additionalInstructions": null }

EXIT CODES:
  0  summary printed
  2  the input cannot be summarised (no content, too short/long, empty PDF)
  3  the backend failed (unavailable, malformed response, refused)
  1  anything else (configuration, I/O)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Summarise captured web pages, screenshots and PDFs with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "summarize",
    version,
    about = "Summarise captured web pages, screenshots and PDFs with an LLM",
    long_about = "Summarise a browser capture (page HTML, screenshots, PDF bytes or URL, \
pre-extracted text) with a multimodal LLM. Inputs outside the token budget are rejected \
before any remote call. Order-history and social-feed pages get tailored instructions.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Browser capture JSON file (pageUrl, html, screenshot[], isPdf, ...).
    #[arg(long, env = "SUMMARIZE_CAPTURE")]
    capture: Option<PathBuf>,

    /// Page URL. Overrides the capture file's pageUrl.
    #[arg(long, env = "SUMMARIZE_URL")]
    url: Option<String>,

    /// HTML file of the page.
    #[arg(long, env = "SUMMARIZE_HTML")]
    html: Option<PathBuf>,

    /// Screenshot image file; repeat for several. Only the first is sent to the model.
    #[arg(long = "screenshot", env = "SUMMARIZE_SCREENSHOTS", value_delimiter = ',')]
    screenshots: Vec<PathBuf>,

    /// PDF file path or HTTP/HTTPS URL.
    #[arg(long, env = "SUMMARIZE_PDF")]
    pdf: Option<String>,

    /// File of already-extracted text.
    #[arg(long, env = "SUMMARIZE_TEXT")]
    text: Option<PathBuf>,

    /// Additional instructions appended to the prompt.
    #[arg(long, env = "SUMMARIZE_INSTRUCTIONS")]
    instructions: Option<String>,

    /// Run tesseract OCR on screenshots (needs the `tesseract` binary).
    #[arg(long, env = "SUMMARIZE_OCR")]
    ocr: bool,

    /// Tesseract language code.
    #[arg(long, env = "SUMMARIZE_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Minimum input tokens.
    #[arg(long, env = "SUMMARIZE_MIN_TOKENS", default_value_t = 50)]
    min_tokens: usize,

    /// Maximum input tokens.
    #[arg(long, env = "SUMMARIZE_MAX_TOKENS", default_value_t = 10_000)]
    max_tokens: usize,

    /// Cap on generated tokens.
    #[arg(long, env = "SUMMARIZE_MAX_OUTPUT_TOKENS", default_value_t = 4096)]
    max_output_tokens: usize,

    /// Character budget for PDF text (truncated, not rejected).
    #[arg(long, env = "SUMMARIZE_PDF_MAX_CHARS", default_value_t = 40_000)]
    pdf_max_chars: usize,

    /// How OCR text combines with HTML text.
    #[arg(long, env = "SUMMARIZE_MERGE_POLICY", value_enum, default_value = "prefer-ocr")]
    merge_policy: MergePolicyArg,

    /// Backend call timeout in seconds (default: 10 + max-output-tokens / 50).
    #[arg(long, env = "SUMMARIZE_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// PDF download timeout in seconds.
    #[arg(long, env = "SUMMARIZE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Write per-stage audit logs into this directory.
    #[arg(long, env = "SUMMARIZE_AUDIT_DIR")]
    audit_dir: Option<PathBuf>,

    /// Output the Summary as JSON instead of plain text.
    #[arg(long, env = "SUMMARIZE_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SUMMARIZE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SUMMARIZE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum MergePolicyArg {
    PreferOcr,
    Append,
}

impl From<MergePolicyArg> for MergePolicy {
    fn from(v: MergePolicyArg) -> Self {
        match v {
            MergePolicyArg::PreferOcr => MergePolicy::PreferOcr,
            MergePolicyArg::Append => MergePolicy::Append,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback in normal mode; keep library logs
    // at error level unless asked for more.
    let show_progress = !cli.quiet && !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build request and engine ─────────────────────────────────────────
    let request = build_request(&cli).await?;
    let observer = CliObserver::new(show_progress, cli.audit_dir.clone())?;
    let config = build_config(&cli, Arc::clone(&observer) as Arc<dyn SummaryObserver>)?;

    let ocr: Arc<dyn OcrEngine> = if cli.ocr {
        Arc::new(TesseractOcr::with_language(cli.ocr_lang.clone()))
    } else {
        Arc::new(NoOcr)
    };
    let preparer = CapturePreparer::new()
        .with_ocr(ocr)
        .with_download_timeout_secs(config.download_timeout_secs);

    let summarizer = match Summarizer::new(config) {
        Ok(s) => s,
        Err(e) => {
            observer.finish();
            return fail(&e);
        }
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let input = match preparer.prepare(&request).await {
        Ok(input) => input,
        Err(e) => {
            observer.finish();
            return fail(&e);
        }
    };

    let summary = match summarizer.summarize(input).await {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else {
        write_summary(&mut io::stdout().lock(), &summary.text)?;
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            summary.template,
            dim(&format!(
                "{} in / {} out tokens  {}ms",
                summary.prompt_tokens, summary.completion_tokens, summary.duration_ms
            )),
        );
    }

    Ok(())
}

/// Print an engine failure and exit with the code for its class.
fn write_summary(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|_| out.write_all(b"\n"))
        .and_then(|_| out.flush())
        .context("Failed to write to stdout")
}

fn fail(error: &SummaryError) -> Result<()> {
    eprintln!("{} {}", red("✘"), error);
    std::process::exit(exit_code(error));
}

fn exit_code(error: &SummaryError) -> i32 {
    match error.class() {
        FailureClass::Client => 2,
        FailureClass::Backend => 3,
        FailureClass::Internal => 1,
    }
}

/// Map CLI args to `SummarizerConfig`.
fn build_config(cli: &Cli, observer: Arc<dyn SummaryObserver>) -> Result<SummarizerConfig> {
    let mut builder = SummarizerConfig::builder()
        .min_tokens(cli.min_tokens)
        .max_tokens(cli.max_tokens)
        .max_output_tokens(cli.max_output_tokens)
        .pdf_max_chars(cli.pdf_max_chars)
        .merge_policy(cli.merge_policy.clone().into())
        .download_timeout_secs(cli.download_timeout)
        .observer(observer);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }

    builder.build().context("Invalid configuration")
}

/// Load `--capture` (if any) and layer the individual input flags on top.
async fn build_request(cli: &Cli) -> Result<CaptureRequest> {
    let mut request = match cli.capture {
        Some(ref path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read capture file {:?}", path))?;
            serde_json::from_str::<CaptureRequest>(&raw)
                .with_context(|| format!("Invalid capture JSON in {:?}", path))?
        }
        None => CaptureRequest::default(),
    };

    if let Some(ref url) = cli.url {
        request.page_url = url.clone();
    }
    if let Some(ref path) = cli.html {
        request.html = read_text(path).await?;
    }
    for path in &cli.screenshots {
        request.screenshot.push(screenshot_data_url(path).await?);
    }
    if let Some(ref pdf) = cli.pdf {
        request.is_pdf = true;
        if is_url(pdf) {
            request.direct_pdf_url = Some(pdf.clone());
            if request.page_url.is_empty() {
                request.page_url = pdf.clone();
            }
        } else {
            let bytes = tokio::fs::read(pdf)
                .await
                .with_context(|| format!("Failed to read PDF {:?}", pdf))?;
            request.pdf_data = Some(STANDARD.encode(bytes));
        }
    }
    if let Some(ref path) = cli.text {
        request.extracted_text = Some(read_text(path).await?);
    }
    if let Some(ref extra) = cli.instructions {
        request.additional_instructions = Some(extra.clone());
    }

    Ok(request)
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))
}

/// Read an image file and wrap it the way browsers send screenshots.
async fn screenshot_data_url(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read screenshot {:?}", path))?;
    let mime = image::guess_format(&bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("image/png");
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}
