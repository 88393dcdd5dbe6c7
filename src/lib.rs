//! # md2pdf-client
//!
//! Client-side controller for a markdown-to-PDF conversion service.
//!
//! The crate models the page a user works in: a markdown buffer with a live
//! HTML preview, an optional uploaded file, and a submit button that sends
//! everything to the conversion server and saves the PDF that comes back.
//!
//! ## Request Lifecycle
//!
//! ```text
//! submit
//!  │
//!  ├─ 1. Validate  blank buffer and no file → alert, nothing sent
//!  ├─ 2. Busy      submit control disabled, label "Converting..."
//!  ├─ 3. Payload   multipart: markdown-text (+ file)
//!  ├─ 4. Route     /convert with a file, /convert_text without
//!  ├─ 5. Filename  Content-Disposition → <file>.pdf → document.pdf
//!  ├─ 6. Download  object URL → anchor click → revoke
//!  └─ 7. Restore   submit control back to its original state, always
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf_client::{ClientConfig, ConversionController, HeadlessHost, HttpTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://127.0.0.1:5000")
//!         .build()?;
//!     let transport = HttpTransport::new(&config)?;
//!     let host = HeadlessHost::new("out");
//!
//!     let mut controller = ConversionController::new(host, transport, config);
//!     controller.set_text("# Hello\n\nConverted by the server.");
//!     let outcome = controller.on_submit().await;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2pdf-client = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod example;
pub mod filename;
pub mod host;
pub mod outcome;
pub mod render;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use controller::ConversionController;
pub use document::{AttachedFile, DocumentSource, FileHandle};
pub use error::{ClientError, HostError, TransportError};
pub use example::EXAMPLE_DOCUMENT;
pub use filename::{derive_filename, parse_content_disposition, DEFAULT_FILENAME};
pub use host::{DocumentHost, HeadlessHost, ObjectUrl, SubmitControl};
pub use outcome::{ConversionResult, SubmissionState, SubmitOutcome};
pub use render::{CmarkRenderer, MarkdownRenderer, RenderOptions};
pub use transport::{
    ConversionRequest, ConversionResponse, ConversionTransport, Endpoint, FormField, HttpTransport,
};
