//! CLI binary for md2pdf-client.
//!
//! A thin shim that plays the part of the browser page: it feeds the
//! command-line input to a [`ConversionController`] as if the user had picked
//! a file or typed text, then presses submit.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2pdf_client::{
    ClientConfig, ConversionController, ConversionTransport, DocumentHost, FileHandle,
    HeadlessHost, HostError, HttpTransport, ObjectUrl, SubmitControl, SubmitOutcome,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal host ────────────────────────────────────────────────────────────

/// [`HeadlessHost`] plus terminal feedback: alerts go to stderr, and the
/// disabled submit control shows as a spinner carrying the busy label.
struct TerminalHost {
    inner: HeadlessHost,
    spinner: Option<ProgressBar>,
    show_spinner: bool,
}

impl TerminalHost {
    fn new(inner: HeadlessHost, show_spinner: bool) -> Self {
        Self {
            inner,
            spinner: None,
            show_spinner,
        }
    }
}

#[async_trait]
impl DocumentHost for TerminalHost {
    fn set_preview(&mut self, html: &str) {
        self.inner.set_preview(html);
    }

    fn set_file_indicator(&mut self, name: Option<&str>) {
        self.inner.set_file_indicator(name);
    }

    fn alert(&mut self, message: &str) {
        if let Some(bar) = &self.spinner {
            bar.suspend(|| eprintln!("{} {}", red("✘"), message));
        } else {
            eprintln!("{} {}", red("✘"), message);
        }
        self.inner.alert(message);
    }

    fn submit_control(&self) -> SubmitControl {
        self.inner.submit_control()
    }

    fn set_submit_control(&mut self, control: SubmitControl) {
        if control.disabled && self.show_spinner {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}  ⏱ {elapsed}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_message(control.label.clone());
            bar.enable_steady_tick(Duration::from_millis(80));
            self.spinner = Some(bar);
        } else if !control.disabled {
            if let Some(bar) = self.spinner.take() {
                bar.finish_and_clear();
            }
        }
        self.inner.set_submit_control(control);
    }

    async fn read_file(&self, file: &FileHandle) -> Result<Vec<u8>, HostError> {
        self.inner.read_file(file).await
    }

    fn create_object_url(&mut self, payload: Vec<u8>) -> Result<ObjectUrl, HostError> {
        self.inner.create_object_url(payload)
    }

    fn trigger_download(&mut self, url: &ObjectUrl, filename: &str) -> Result<PathBuf, HostError> {
        self.inner.trigger_download(url, filename)
    }

    fn revoke_object_url(&mut self, url: ObjectUrl) {
        self.inner.revoke_object_url(url);
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Convert the built-in example document
  md2pdf

  # Upload a markdown file (saved as notes.pdf unless the server names it)
  md2pdf notes.md

  # Convert inline text into ./out
  md2pdf --text "# Hello" -o out

  # Write the live preview as an HTML page too
  md2pdf notes.md --preview preview.html

  # Check that the server is up
  md2pdf --check --server http://localhost:5000

  # Machine-readable outcome
  md2pdf notes.md --json

ENVIRONMENT VARIABLES:
  MD2PDF_SERVER      Conversion server base URL
  MD2PDF_TIMEOUT     Request timeout in seconds
  MD2PDF_OUTPUT_DIR  Where downloaded PDFs are saved
  MD2PDF_PREVIEW     Preview HTML path
  RUST_LOG           Overrides the log filter (e.g. md2pdf_client=debug)
"##;

/// Convert markdown to PDF through a conversion server.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert markdown to PDF through a conversion server",
    long_about = "Send markdown text or a markdown file to a markdown-to-PDF conversion \
server and save the PDF it returns. With no input, the built-in example document is converted.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to upload (.md, .markdown, .txt).
    file: Option<PathBuf>,

    /// Markdown text for the buffer. Sent alongside FILE when both are given.
    #[arg(long)]
    text: Option<String>,

    /// Replace the buffer with the built-in example document.
    #[arg(long)]
    example: bool,

    /// Conversion server base URL.
    #[arg(long, env = "MD2PDF_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Directory downloaded PDFs are saved to.
    #[arg(short, long, env = "MD2PDF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Also write the rendered preview to this HTML file.
    #[arg(long, env = "MD2PDF_PREVIEW")]
    preview: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, env = "MD2PDF_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Print the submission outcome as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Only check the server's /health endpoint.
    #[arg(long)]
    check: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    // ── Build config ─────────────────────────────────────────────────────
    let config = ClientConfig::builder()
        .base_url(cli.server.clone())
        .timeout_secs(cli.timeout)
        .build()
        .context("Invalid configuration")?;

    let transport = HttpTransport::new(&config).context("Failed to create HTTP client")?;

    // ── Health check mode ────────────────────────────────────────────────
    if cli.check {
        let healthy = transport
            .health()
            .await
            .with_context(|| format!("Could not reach {}", config.base_url))?;
        if healthy {
            println!("{} {} is healthy", green("✔"), config.base_url);
            return Ok(ExitCode::SUCCESS);
        }
        println!("{} {} is not healthy", red("✘"), config.base_url);
        return Ok(ExitCode::FAILURE);
    }

    // ── Page setup ───────────────────────────────────────────────────────
    let mut headless = HeadlessHost::new(&cli.output_dir);
    if let Some(ref path) = cli.preview {
        headless = headless.with_preview_path(path);
    }
    let show_spinner = !cli.quiet && !cli.json;
    let host = TerminalHost::new(headless, show_spinner);

    let mut controller = ConversionController::new(host, transport, config);
    controller.initialize();

    // ── User input, in the order a user would provide it ─────────────────
    if let Some(ref path) = cli.file {
        controller
            .on_file_selected(Some(FileHandle::from_path(path)))
            .await;
        if controller.attached_file().is_none() {
            // Read failure was already alerted.
            return Ok(ExitCode::FAILURE);
        }
    }
    if let Some(text) = cli.text.clone() {
        controller.set_text(text);
    }
    if cli.example {
        controller.on_load_example();
    }

    // ── Submit ───────────────────────────────────────────────────────────
    let outcome = controller.on_submit().await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
        );
    } else if !cli.quiet {
        if let SubmitOutcome::Downloaded {
            ref location, size, ..
        } = outcome
        {
            eprintln!(
                "{}  {} bytes  →  {}",
                green("✔"),
                size,
                bold(&location.display().to_string())
            );
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
