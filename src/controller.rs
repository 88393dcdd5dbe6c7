//! The Conversion Request Controller.
//!
//! Owns the Document Source and reacts to the page's input events:
//!
//! ```text
//! file picked ──▶ on_file_selected ──▶ read ──▶ buffer ──▶ preview
//! keystroke   ──▶ on_text_changed  ─────────────────────▶ preview
//! clear       ──▶ on_clear         ──▶ empty buffer ─────▶ preview
//! example     ──▶ on_load_example  ──▶ sample buffer ────▶ preview
//! submit      ──▶ on_submit ──▶ validate ──▶ POST ──▶ filename ──▶ download
//! ```
//!
//! Every operation takes `&mut self`, so two submissions can never overlap;
//! the Submitting state exists to drive the submit control, not as a lock.

use crate::config::ClientConfig;
use crate::document::{AttachedFile, DocumentSource, FileHandle};
use crate::error::ClientError;
use crate::example::EXAMPLE_DOCUMENT;
use crate::filename::derive_filename;
use crate::host::{DocumentHost, SubmitControl};
use crate::outcome::{ConversionResult, SubmissionState, SubmitOutcome};
use crate::render::{CmarkRenderer, MarkdownRenderer};
use crate::transport::{ConversionRequest, ConversionTransport};
use tracing::{debug, info, warn};

/// Drives preview, upload, conversion and download for one page.
pub struct ConversionController<H, T, R = CmarkRenderer> {
    host: H,
    transport: T,
    renderer: R,
    config: ClientConfig,
    source: DocumentSource,
    state: SubmissionState,
}

impl<H, T> ConversionController<H, T, CmarkRenderer>
where
    H: DocumentHost,
    T: ConversionTransport,
{
    /// Controller with the default `pulldown-cmark` renderer configured from
    /// `config.render`.
    pub fn new(host: H, transport: T, config: ClientConfig) -> Self {
        let renderer = CmarkRenderer::new(config.render);
        Self::with_renderer(host, transport, renderer, config)
    }
}

impl<H, T, R> ConversionController<H, T, R>
where
    H: DocumentHost,
    T: ConversionTransport,
    R: MarkdownRenderer,
{
    pub fn with_renderer(host: H, transport: T, renderer: R, config: ClientConfig) -> Self {
        Self {
            host,
            transport,
            renderer,
            config,
            source: DocumentSource::default(),
            state: SubmissionState::Idle,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current text buffer.
    pub fn text(&self) -> &str {
        self.source.text()
    }

    pub fn attached_file(&self) -> Option<&AttachedFile> {
        self.source.file()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    // ── Events ───────────────────────────────────────────────────────────

    /// First-load bootstrap: show the example when the buffer is blank,
    /// otherwise render whatever is already there.
    pub fn initialize(&mut self) {
        if self.source.text().trim().is_empty() {
            self.on_load_example();
        } else {
            self.on_text_changed();
        }
    }

    /// A file was picked (`Some`) or the selection was cleared (`None`).
    ///
    /// A picked file replaces the buffer with its content and stays attached
    /// for submission. Clearing the selection detaches the file but leaves
    /// the buffer alone.
    pub async fn on_file_selected(&mut self, file: Option<FileHandle>) {
        let Some(handle) = file else {
            self.host.set_file_indicator(None);
            self.source.detach();
            return;
        };

        self.host.set_file_indicator(Some(&handle.name));

        match self.host.read_file(&handle).await {
            Ok(bytes) => {
                let attached = AttachedFile {
                    name: handle.name,
                    bytes,
                };
                debug!("Read {} ({} bytes)", attached.name, attached.bytes.len());
                self.source.set_text(attached.text());
                self.source.attach(attached);
                self.on_text_changed();
            }
            Err(e) => {
                warn!("{}", e);
                self.host.set_file_indicator(None);
                self.source.detach();
                self.host.alert(&e.to_string());
            }
        }
    }

    /// Replace the buffer as an edit would, then re-render.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.source.set_text(text);
        self.on_text_changed();
    }

    /// Re-render the preview from the current buffer. Called on every edit.
    pub fn on_text_changed(&mut self) {
        let html = self.renderer.render(self.source.text());
        debug!("Preview rendered: {} bytes", html.len());
        self.host.set_preview(&html);
    }

    /// Empty the buffer and drop any selected file.
    pub fn on_clear(&mut self) {
        self.source.clear();
        self.host.set_file_indicator(None);
        self.on_text_changed();
    }

    /// Replace the buffer with the demonstration document.
    pub fn on_load_example(&mut self) {
        self.source.set_text(EXAMPLE_DOCUMENT);
        self.on_text_changed();
    }

    /// Convert the current Document Source and hand the PDF to the host.
    ///
    /// Never returns an error: every failure has already been alerted by the
    /// time the outcome comes back, and the submit control is back in the
    /// state it was in before the call.
    pub async fn on_submit(&mut self) -> SubmitOutcome {
        if self.source.is_empty() {
            let message = ClientError::EmptyInput.user_message();
            self.host.alert(&message);
            return SubmitOutcome::Rejected { message };
        }

        let original = self.host.submit_control();
        self.host.set_submit_control(SubmitControl {
            label: self.config.busy_label.clone(),
            disabled: true,
        });
        self.state = SubmissionState::Submitting;

        let outcome = match self.submit().await {
            Ok(downloaded) => downloaded,
            Err(e) => {
                warn!("Conversion failed: {}", e);
                let message = e.user_message();
                self.host.alert(&message);
                SubmitOutcome::Failed {
                    message,
                    status: e.status(),
                }
            }
        };

        self.host.set_submit_control(original);
        self.state = SubmissionState::Idle;
        outcome
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    async fn submit(&mut self) -> Result<SubmitOutcome, ClientError> {
        let request = ConversionRequest::for_source(&self.source);
        info!("Submitting to {}", request.endpoint.path());

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::Server {
                status: response.status,
                message: response.error_message(),
            });
        }

        let filename = derive_filename(
            response.content_disposition.as_deref(),
            self.source.file().map(|f| f.name.as_str()),
            &self.config.default_filename,
        );
        self.download(ConversionResult {
            filename,
            payload: response.body,
        })
    }

    /// Object URL → anchor click → revoke. The URL is revoked even when the
    /// click fails.
    fn download(&mut self, result: ConversionResult) -> Result<SubmitOutcome, ClientError> {
        let ConversionResult { filename, payload } = result;
        let size = payload.len();

        let url = self.host.create_object_url(payload)?;
        let saved = self.host.trigger_download(&url, &filename);
        self.host.revoke_object_url(url);
        let location = saved?;

        info!("Downloaded {} ({} bytes)", filename, size);
        Ok(SubmitOutcome::Downloaded {
            filename,
            location,
            size,
        })
    }
}
