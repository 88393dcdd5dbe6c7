//! Controller behaviour against a recording host and a scripted transport.
//!
//! No network and no filesystem: the host records every UI call, the
//! transport replays canned responses and remembers what it was sent.

use async_trait::async_trait;
use md2pdf_client::transport::{FILE_FIELD, MARKDOWN_FIELD};
use md2pdf_client::{
    ClientConfig, ConversionController, ConversionRequest, ConversionResponse,
    ConversionTransport, DocumentHost, Endpoint, FileHandle, FormField, HostError,
    MarkdownRenderer, ObjectUrl, SubmissionState, SubmitControl, SubmitOutcome, TransportError,
    EXAMPLE_DOCUMENT,
};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ── Test doubles ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingHost {
    preview: String,
    indicator: Option<String>,
    alerts: Vec<String>,
    control: SubmitControl,
    control_history: Vec<SubmitControl>,
    files: HashMap<PathBuf, Vec<u8>>,
    staged: HashMap<ObjectUrl, Vec<u8>>,
    created: usize,
    revoked: Vec<ObjectUrl>,
    downloads: Vec<(String, Vec<u8>)>,
    fail_download: bool,
}

impl RecordingHost {
    fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(PathBuf::from(path), content.as_bytes().to_vec());
        self
    }
}

#[async_trait]
impl DocumentHost for RecordingHost {
    fn set_preview(&mut self, html: &str) {
        self.preview = html.to_string();
    }

    fn set_file_indicator(&mut self, name: Option<&str>) {
        self.indicator = name.map(str::to_string);
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn submit_control(&self) -> SubmitControl {
        self.control.clone()
    }

    fn set_submit_control(&mut self, control: SubmitControl) {
        self.control_history.push(control.clone());
        self.control = control;
    }

    async fn read_file(&self, file: &FileHandle) -> Result<Vec<u8>, HostError> {
        self.files
            .get(&file.path)
            .cloned()
            .ok_or_else(|| HostError::FileRead {
                path: file.path.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }

    fn create_object_url(&mut self, payload: Vec<u8>) -> Result<ObjectUrl, HostError> {
        self.created += 1;
        let url = ObjectUrl::new(format!("blob:test/{}", self.created));
        self.staged.insert(url.clone(), payload);
        Ok(url)
    }

    fn trigger_download(&mut self, url: &ObjectUrl, filename: &str) -> Result<PathBuf, HostError> {
        if self.fail_download {
            return Err(HostError::DownloadFailed {
                path: PathBuf::from(filename),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        let payload = self
            .staged
            .get(url)
            .cloned()
            .ok_or_else(|| HostError::UnknownObjectUrl(url.to_string()))?;
        self.downloads.push((filename.to_string(), payload));
        Ok(PathBuf::from("downloads").join(filename))
    }

    fn revoke_object_url(&mut self, url: ObjectUrl) {
        self.staged.remove(&url);
        self.revoked.push(url);
    }
}

#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ConversionResponse, TransportError>>>,
    requests: Mutex<Vec<ConversionRequest>>,
}

impl ScriptedTransport {
    fn replying(response: Result<ConversionResponse, TransportError>) -> Self {
        let t = Self::default();
        t.responses.lock().unwrap().push_back(response);
        t
    }

    fn requests(&self) -> Vec<ConversionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversionTransport for ScriptedTransport {
    async fn send(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request")
    }

    async fn health(&self) -> Result<bool, TransportError> {
        Ok(true)
    }
}

#[derive(Default)]
struct CountingRenderer {
    calls: AtomicUsize,
}

impl MarkdownRenderer for CountingRenderer {
    fn render(&self, markdown: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        format!("<p>{markdown}</p>")
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn pdf(disposition: Option<&str>) -> Result<ConversionResponse, TransportError> {
    Ok(ConversionResponse {
        status: 200,
        content_disposition: disposition.map(str::to_string),
        body: b"%PDF-1.4 fake".to_vec(),
    })
}

fn controller(
    host: RecordingHost,
    transport: ScriptedTransport,
) -> ConversionController<RecordingHost, ScriptedTransport> {
    ConversionController::new(host, transport, ClientConfig::default())
}

fn initial_control() -> SubmitControl {
    SubmitControl {
        label: "Convert to PDF".into(),
        disabled: false,
    }
}

// ── Preview ──────────────────────────────────────────────────────────────────

#[test]
fn every_edit_renders_exactly_once() {
    let renderer = CountingRenderer::default();
    let mut c = ConversionController::with_renderer(
        RecordingHost::default(),
        ScriptedTransport::default(),
        &renderer,
        ClientConfig::default(),
    );

    for (i, text) in ["#", "# H", "# He", "# Hey", ""].into_iter().enumerate() {
        c.set_text(text);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), i + 1);
        assert_eq!(c.host().preview, format!("<p>{text}</p>"));
    }
}

#[test]
fn render_count_matches_edit_count() {
    let renderer = CountingRenderer::default();
    let mut c = ConversionController::with_renderer(
        RecordingHost::default(),
        ScriptedTransport::default(),
        &renderer,
        ClientConfig::default(),
    );

    c.set_text("a");
    c.set_text("ab");
    c.on_text_changed();
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
    assert_eq!(c.host().preview, "<p>ab</p>");
}

#[test]
fn default_renderer_preview_is_html() {
    let mut c = controller(RecordingHost::default(), ScriptedTransport::default());
    c.set_text("# Title\nline");
    assert!(c.host().preview.contains("<h1>Title</h1>"));
}

// ── Bootstrap, clear, example ────────────────────────────────────────────────

#[test]
fn initialize_loads_example_into_blank_buffer() {
    let mut c = controller(RecordingHost::default(), ScriptedTransport::default());
    c.initialize();
    assert_eq!(c.text(), EXAMPLE_DOCUMENT);
    assert!(c.host().preview.contains("<table>"));
}

#[test]
fn initialize_keeps_existing_text() {
    let mut c = controller(RecordingHost::default(), ScriptedTransport::default());
    c.set_text("# Mine");
    c.host_mut().preview.clear();
    c.initialize();
    assert_eq!(c.text(), "# Mine");
    assert_eq!(c.host().preview.trim(), "<h1>Mine</h1>");
}

#[tokio::test]
async fn clear_then_example_is_deterministic() {
    let host = RecordingHost::default().with_file("/in/notes.md", "# Notes");
    let mut c = controller(host, ScriptedTransport::default());

    c.on_file_selected(Some(FileHandle::from_path("/in/notes.md"))).await;
    c.set_text("something else entirely");
    c.on_clear();
    c.on_load_example();
    let first = (c.text().to_string(), c.host().preview.clone());

    c.set_text("changed");
    c.on_clear();
    c.on_load_example();
    assert_eq!((c.text().to_string(), c.host().preview.clone()), first);
    assert_eq!(first.0, EXAMPLE_DOCUMENT);
}

#[tokio::test]
async fn clear_is_idempotent() {
    let host = RecordingHost::default().with_file("/in/notes.md", "# Notes");
    let mut c = controller(host, ScriptedTransport::default());
    c.on_file_selected(Some(FileHandle::from_path("/in/notes.md"))).await;

    c.on_clear();
    let after_once = (c.text().to_string(), c.host().preview.clone(), c.host().indicator.clone());
    c.on_clear();
    let after_twice = (c.text().to_string(), c.host().preview.clone(), c.host().indicator.clone());

    assert_eq!(after_once, after_twice);
    assert_eq!(c.text(), "");
    assert!(c.attached_file().is_none());
    assert_eq!(c.host().indicator, None);
    assert_eq!(c.host().preview, "");
}

// ── File selection ───────────────────────────────────────────────────────────

#[tokio::test]
async fn selecting_file_loads_buffer_and_indicator() {
    let host = RecordingHost::default().with_file("/in/notes.md", "# Notes\n\nbody");
    let mut c = controller(host, ScriptedTransport::default());

    c.on_file_selected(Some(FileHandle::from_path("/in/notes.md"))).await;

    assert_eq!(c.host().indicator.as_deref(), Some("notes.md"));
    assert_eq!(c.text(), "# Notes\n\nbody");
    assert!(c.host().preview.contains("<h1>Notes</h1>"));
    assert_eq!(c.attached_file().map(|f| f.name.as_str()), Some("notes.md"));
}

#[tokio::test]
async fn deselecting_keeps_typed_text() {
    let host = RecordingHost::default().with_file("/in/notes.md", "# Notes");
    let mut c = controller(host, ScriptedTransport::default());

    c.on_file_selected(Some(FileHandle::from_path("/in/notes.md"))).await;
    c.set_text("# Notes\n\nplus my edits");
    c.on_file_selected(None).await;

    assert_eq!(c.host().indicator, None);
    assert_eq!(c.text(), "# Notes\n\nplus my edits");
    assert!(c.attached_file().is_none());
}

#[tokio::test]
async fn unreadable_file_alerts_and_keeps_buffer() {
    let mut c = controller(RecordingHost::default(), ScriptedTransport::default());
    c.set_text("typed before");

    c.on_file_selected(Some(FileHandle::from_path("/missing.md"))).await;

    assert_eq!(c.text(), "typed before");
    assert_eq!(c.host().indicator, None);
    assert!(c.attached_file().is_none());
    assert_eq!(c.host().alerts.len(), 1);
    assert!(c.host().alerts[0].contains("missing.md"));
}

// ── Submit: validation ───────────────────────────────────────────────────────

#[tokio::test]
async fn empty_submit_sends_nothing() {
    let mut c = controller(RecordingHost::default(), ScriptedTransport::default());
    c.set_text("   \n\t");

    let outcome = c.on_submit().await;

    assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
    assert!(c.transport().requests().is_empty());
    assert_eq!(
        c.host().alerts,
        vec!["Please enter some markdown text or upload a file".to_string()]
    );
    assert_eq!(c.host().control, initial_control());
    assert!(c.host().control_history.is_empty());
    assert_eq!(c.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn empty_file_still_submits() {
    let host = RecordingHost::default().with_file("/in/empty.md", "");
    let mut c = controller(host, ScriptedTransport::replying(pdf(None)));
    c.on_file_selected(Some(FileHandle::from_path("/in/empty.md"))).await;

    let outcome = c.on_submit().await;

    assert!(outcome.is_success());
    assert_eq!(c.transport().requests()[0].endpoint, Endpoint::ConvertFile);
}

// ── Submit: routing and payload ──────────────────────────────────────────────

#[tokio::test]
async fn text_only_goes_to_convert_text() {
    let mut c = controller(RecordingHost::default(), ScriptedTransport::replying(pdf(None)));
    c.set_text("# Hello");

    c.on_submit().await;

    let requests = c.transport().requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.endpoint.path(), "/convert_text");
    assert_eq!(req.fields.len(), 1);
    assert!(matches!(
        req.field(MARKDOWN_FIELD),
        Some(FormField::Text { value, .. }) if value == "# Hello"
    ));
}

#[tokio::test]
async fn attached_file_goes_to_convert_with_both_fields() {
    let host = RecordingHost::default().with_file("/in/notes.md", "# From file");
    let mut c = controller(host, ScriptedTransport::replying(pdf(None)));
    c.on_file_selected(Some(FileHandle::from_path("/in/notes.md"))).await;
    c.set_text("# Typed over");

    c.on_submit().await;

    let requests = c.transport().requests();
    let req = &requests[0];
    assert_eq!(req.endpoint.path(), "/convert");
    assert!(matches!(
        req.field(MARKDOWN_FIELD),
        Some(FormField::Text { value, .. }) if value == "# Typed over"
    ));
    assert!(matches!(
        req.field(FILE_FIELD),
        Some(FormField::File { filename, bytes, .. })
            if filename == "notes.md" && bytes == b"# From file"
    ));
}

// ── Submit: success ──────────────────────────────────────────────────────────

#[tokio::test]
async fn filename_from_content_disposition() {
    let host = RecordingHost::default().with_file("/in/notes.md", "# Notes");
    let mut c = controller(
        host,
        ScriptedTransport::replying(pdf(Some(r#"attachment; filename="report.pdf""#))),
    );
    c.on_file_selected(Some(FileHandle::from_path("/in/notes.md"))).await;

    let outcome = c.on_submit().await;

    match outcome {
        SubmitOutcome::Downloaded {
            filename, size, location,
        } => {
            assert_eq!(filename, "report.pdf");
            assert_eq!(size, b"%PDF-1.4 fake".len());
            assert_eq!(location, PathBuf::from("downloads/report.pdf"));
        }
        other => panic!("expected download, got {other:?}"),
    }
    assert_eq!(c.host().downloads[0].1, b"%PDF-1.4 fake");
}

#[tokio::test]
async fn filename_from_attached_file() {
    let host = RecordingHost::default().with_file("/in/notes.md", "# Notes");
    let mut c = controller(host, ScriptedTransport::replying(pdf(None)));
    c.on_file_selected(Some(FileHandle::from_path("/in/notes.md"))).await;

    c.on_submit().await;

    assert_eq!(c.host().downloads[0].0, "notes.pdf");
}

#[tokio::test]
async fn filename_defaults_to_document_pdf() {
    let mut c = controller(
        RecordingHost::default(),
        ScriptedTransport::replying(pdf(Some("attachment"))),
    );
    c.set_text("# Hi");

    c.on_submit().await;

    assert_eq!(c.host().downloads[0].0, "document.pdf");
}

#[tokio::test]
async fn success_leaves_no_residue_and_restores_control() {
    let mut c = controller(RecordingHost::default(), ScriptedTransport::replying(pdf(None)));
    c.set_text("# Hi");

    c.on_submit().await;

    let host = c.host();
    assert_eq!(host.created, 1);
    assert_eq!(host.revoked.len(), 1);
    assert!(host.staged.is_empty());
    assert!(host.alerts.is_empty());
    assert_eq!(
        host.control_history,
        vec![
            SubmitControl {
                label: "Converting...".into(),
                disabled: true
            },
            initial_control(),
        ]
    );
    assert_eq!(c.state(), SubmissionState::Idle);
}

// ── Submit: failure ──────────────────────────────────────────────────────────

#[tokio::test]
async fn server_error_message_is_alerted() {
    let mut c = controller(
        RecordingHost::default(),
        ScriptedTransport::replying(Ok(ConversionResponse {
            status: 400,
            content_disposition: None,
            body: br#"{"error": "Invalid file format"}"#.to_vec(),
        })),
    );
    c.set_text("# Hi");

    let outcome = c.on_submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed {
            message: "Invalid file format".into(),
            status: Some(400),
        }
    );
    assert_eq!(c.host().alerts, vec!["Invalid file format".to_string()]);
    assert!(c.host().downloads.is_empty());
    assert_eq!(c.host().control, initial_control());
}

#[tokio::test]
async fn non_json_error_uses_generic_message() {
    let mut c = controller(
        RecordingHost::default(),
        ScriptedTransport::replying(Ok(ConversionResponse {
            status: 502,
            content_disposition: None,
            body: b"Bad Gateway".to_vec(),
        })),
    );
    c.set_text("# Hi");

    c.on_submit().await;

    assert_eq!(
        c.host().alerts,
        vec!["An error occurred during conversion. Please try again.".to_string()]
    );
}

#[tokio::test]
async fn network_failure_restores_custom_control() {
    let mut host = RecordingHost::default();
    host.control = SubmitControl {
        label: "Make PDF".into(),
        disabled: false,
    };
    let mut c = controller(
        host,
        ScriptedTransport::replying(Err(TransportError::Network {
            endpoint: "/convert_text".into(),
            reason: "connection refused".into(),
        })),
    );
    c.set_text("# Hi");

    let outcome = c.on_submit().await;

    assert!(matches!(outcome, SubmitOutcome::Failed { status: None, .. }));
    assert_eq!(c.host().control.label, "Make PDF");
    assert!(!c.host().control.disabled);
    assert_eq!(c.transport().requests().len(), 1, "no retry");
}

#[tokio::test]
async fn failed_download_still_revokes_url() {
    let mut host = RecordingHost::default();
    host.fail_download = true;
    let mut c = controller(host, ScriptedTransport::replying(pdf(None)));
    c.set_text("# Hi");

    let outcome = c.on_submit().await;

    assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
    assert_eq!(c.host().revoked.len(), 1);
    assert!(c.host().staged.is_empty());
    assert_eq!(c.host().control, initial_control());
}

#[tokio::test]
async fn busy_label_is_configurable() {
    let config = ClientConfig::builder().busy_label("Working…").build().unwrap();
    let mut c = ConversionController::new(
        RecordingHost::default(),
        ScriptedTransport::replying(pdf(None)),
        config,
    );
    c.set_text("# Hi");

    c.on_submit().await;

    assert_eq!(c.host().control_history[0].label, "Working…");
    assert!(c.host().control_history[0].disabled);
}
