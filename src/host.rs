//! Document environment the controller drives.
//!
//! A browser page gives a controller a preview element, a file indicator,
//! `alert()`, a submit button, `FileReader`, and blob URLs plus a synthetic
//! `<a download>` click. [`DocumentHost`] names exactly those capabilities so
//! the controller can run against any front-end: a terminal, a GUI, or a
//! recording fake in tests.
//!
//! [`HeadlessHost`] is the filesystem-backed implementation used by the CLI:
//!
//! | Capability        | HeadlessHost                                        |
//! |-------------------|-----------------------------------------------------|
//! | preview           | kept in memory, optionally written as an HTML page  |
//! | file indicator    | kept in memory, logged                              |
//! | alert             | logged at WARN and collected                        |
//! | read file         | `tokio::fs::read`                                   |
//! | object URL        | staging file from `tempfile` in the output dir      |
//! | download          | staging file copied to a new `<output dir>/<name>`  |
//! |                   | taken names become `name (1).pdf`, `name (2).pdf`   |
//! | revoke            | staging file dropped (deleted)                      |

use crate::document::FileHandle;
use crate::error::HostError;
use crate::filename::DEFAULT_FILENAME;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Label and enabled flag of the submit button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitControl {
    pub label: String,
    pub disabled: bool,
}

impl Default for SubmitControl {
    fn default() -> Self {
        Self {
            label: "Convert to PDF".to_string(),
            disabled: false,
        }
    }
}

/// Handle to a payload staged for download, like a `blob:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// UI and I/O surface of the page hosting the controller.
///
/// Every method except [`read_file`](DocumentHost::read_file) is synchronous:
/// in the single-threaded model they complete before the next event is
/// handled.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Replace the preview surface's content.
    fn set_preview(&mut self, html: &str);

    /// Show `Selected: <name>`, or clear the indicator with `None`.
    fn set_file_indicator(&mut self, name: Option<&str>);

    /// Blocking user-visible message.
    fn alert(&mut self, message: &str);

    fn submit_control(&self) -> SubmitControl;

    fn set_submit_control(&mut self, control: SubmitControl);

    /// Read a selected file in full.
    async fn read_file(&self, file: &FileHandle) -> Result<Vec<u8>, HostError>;

    /// Stage `payload` behind a temporary URL.
    fn create_object_url(&mut self, payload: Vec<u8>) -> Result<ObjectUrl, HostError>;

    /// Save the staged payload under `filename`, as a transient anchor click
    /// would. Returns where it landed.
    fn trigger_download(&mut self, url: &ObjectUrl, filename: &str) -> Result<PathBuf, HostError>;

    /// Release a URL from [`create_object_url`](DocumentHost::create_object_url).
    /// Unknown URLs are ignored.
    fn revoke_object_url(&mut self, url: ObjectUrl);
}

/// Filesystem-backed [`DocumentHost`].
#[derive(Debug)]
pub struct HeadlessHost {
    output_dir: PathBuf,
    preview_path: Option<PathBuf>,
    preview: String,
    file_indicator: Option<String>,
    alerts: Vec<String>,
    control: SubmitControl,
    staged: HashMap<ObjectUrl, NamedTempFile>,
    next_url: u64,
}

impl HeadlessHost {
    /// Downloads land in `output_dir`, created on first use.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            preview_path: None,
            preview: String::new(),
            file_indicator: None,
            alerts: Vec::new(),
            control: SubmitControl::default(),
            staged: HashMap::new(),
            next_url: 0,
        }
    }

    /// Also write every preview update to `path` as a standalone HTML page.
    pub fn with_preview_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preview_path = Some(path.into());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn file_indicator(&self) -> Option<&str> {
        self.file_indicator.as_deref()
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Number of object URLs created and not yet revoked.
    pub fn live_object_urls(&self) -> usize {
        self.staged.len()
    }

    fn write_preview_page(&self, path: &Path) -> Result<(), HostError> {
        std::fs::write(path, preview_page(&self.preview)).map_err(|source| {
            HostError::PreviewWrite {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

#[async_trait]
impl DocumentHost for HeadlessHost {
    fn set_preview(&mut self, html: &str) {
        self.preview = html.to_string();
        if let Some(path) = &self.preview_path {
            if let Err(e) = self.write_preview_page(path) {
                warn!("{}", e);
            }
        }
    }

    fn set_file_indicator(&mut self, name: Option<&str>) {
        match name {
            Some(n) => info!("Selected: {}", n),
            None => debug!("File selection cleared"),
        }
        self.file_indicator = name.map(str::to_string);
    }

    fn alert(&mut self, message: &str) {
        warn!("{}", message);
        self.alerts.push(message.to_string());
    }

    fn submit_control(&self) -> SubmitControl {
        self.control.clone()
    }

    fn set_submit_control(&mut self, control: SubmitControl) {
        self.control = control;
    }

    async fn read_file(&self, file: &FileHandle) -> Result<Vec<u8>, HostError> {
        tokio::fs::read(&file.path)
            .await
            .map_err(|source| HostError::FileRead {
                path: file.path.clone(),
                source,
            })
    }

    fn create_object_url(&mut self, payload: Vec<u8>) -> Result<ObjectUrl, HostError> {
        std::fs::create_dir_all(&self.output_dir).map_err(HostError::Staging)?;

        let mut staged = tempfile::Builder::new()
            .prefix(".md2pdf-")
            .suffix(".part")
            .tempfile_in(&self.output_dir)
            .map_err(HostError::Staging)?;
        staged.write_all(&payload).map_err(HostError::Staging)?;
        staged.flush().map_err(HostError::Staging)?;

        self.next_url += 1;
        let url = ObjectUrl::new(format!("blob:md2pdf/{}", self.next_url));
        debug!("Staged {} bytes at {} ({})", payload.len(), url, staged.path().display());
        self.staged.insert(url.clone(), staged);
        Ok(url)
    }

    fn trigger_download(&mut self, url: &ObjectUrl, filename: &str) -> Result<PathBuf, HostError> {
        let staged = self
            .staged
            .get(url)
            .ok_or_else(|| HostError::UnknownObjectUrl(url.to_string()))?;

        let wanted = self.output_dir.join(safe_file_name(filename));
        let (dest, mut file) =
            create_unique(&wanted).map_err(|source| HostError::DownloadFailed {
                path: wanted.clone(),
                source,
            })?;

        let copied = staged
            .reopen()
            .and_then(|mut src| io::copy(&mut src, &mut file));
        if let Err(source) = copied {
            drop(file);
            let _ = std::fs::remove_file(&dest);
            return Err(HostError::DownloadFailed { path: dest, source });
        }

        info!("Saved {}", dest.display());
        Ok(dest)
    }

    fn revoke_object_url(&mut self, url: ObjectUrl) {
        if self.staged.remove(&url).is_some() {
            debug!("Revoked {}", url);
        }
    }
}

/// Keep only the final path component of a suggested filename so a server
/// cannot write outside the output directory.
fn safe_file_name(suggested: &str) -> String {
    Path::new(suggested)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Highest ` (n)` suffix tried before a download gives up.
const MAX_DUPLICATES: u32 = 999;

/// Create `wanted` without touching anything already there. Taken names get
/// a ` (n)` suffix before the extension: `report.pdf`, `report (1).pdf`, ...
fn create_unique(wanted: &Path) -> io::Result<(PathBuf, File)> {
    let dir = wanted.parent().unwrap_or_else(|| Path::new("."));
    let stem = wanted
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = wanted
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    for n in 0..=MAX_DUPLICATES {
        let candidate = if n == 0 {
            wanted.to_path_buf()
        } else {
            dir.join(format!("{stem} ({n}){ext}"))
        };
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{} exists, trying next name", candidate.display());
            }
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {}", wanted.display()),
    ))
}

/// Wrap a preview fragment into a standalone HTML page.
pub fn preview_page(fragment: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Markdown preview</title>\n</head>\n<body>\n{fragment}</body>\n</html>\n"
    )
}
