//! Error types for the md2pdf-client library.
//!
//! Three layers, one per collaborator:
//!
//! * [`TransportError`]: the request never produced an HTTP response
//!   (connection refused, timeout, bad base URL).
//! * [`HostError`]: the document environment failed (file could not be
//!   read, download could not be saved).
//! * [`ClientError`]: everything a submission can end with, including
//!   validation and non-2xx server answers.
//!
//! None of these escape [`crate::controller::ConversionController::on_submit`]:
//! the controller turns them into an alert plus a
//! [`crate::outcome::SubmitOutcome`]. They are public so custom transports and
//! hosts can report failures in the same vocabulary.

use std::path::PathBuf;
use thiserror::Error;

/// Shown when the user submits an empty buffer with no file attached.
pub const EMPTY_INPUT_MESSAGE: &str = "Please enter some markdown text or upload a file";

/// Shown when the server gave no structured `error` field.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred during conversion. Please try again.";

/// All errors a submission can end with.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Validation ────────────────────────────────────────────────────────
    /// Buffer is empty or whitespace-only and no file is attached.
    #[error("{}", EMPTY_INPUT_MESSAGE)]
    EmptyInput,

    // ── Network ───────────────────────────────────────────────────────────
    /// The request could not be delivered or no response arrived.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    ///
    /// `message` holds the `error` field of a JSON body when there was one.
    #[error("Server returned HTTP {status}{}", detail_suffix(.message))]
    Server { status: u16, message: Option<String> },

    // ── Document environment ──────────────────────────────────────────────
    #[error(transparent)]
    Host(#[from] HostError),

    // ── Config ────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// The text shown to the user in an alert for this failure.
    ///
    /// Structured server messages win; every other transport or host failure
    /// collapses to [`GENERIC_FAILURE_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            ClientError::EmptyInput => EMPTY_INPUT_MESSAGE.to_string(),
            ClientError::Server {
                message: Some(m), ..
            } if !m.is_empty() => m.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// HTTP status if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn detail_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {m}"),
        _ => String::new(),
    }
}

/// Failures below the HTTP status line.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, broken body stream, etc.
    #[error("Request to '{endpoint}' failed: {reason}\nIs the conversion server running?")]
    Network { endpoint: String, reason: String },

    /// No response within the configured timeout.
    #[error("Request to '{endpoint}' timed out after {secs}s\nIncrease --timeout.")]
    Timeout { endpoint: String, secs: u64 },

    /// Base URL and endpoint path do not form a valid URL.
    #[error("Invalid server URL '{url}'")]
    InvalidUrl { url: String },
}

/// Failures of the document environment.
#[derive(Debug, Error)]
pub enum HostError {
    /// The selected file could not be read.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not stage the payload behind an object URL.
    #[error("Failed to stage download: {0}")]
    Staging(#[source] std::io::Error),

    /// The object URL was already revoked or never existed.
    #[error("Unknown object URL '{0}'")]
    UnknownObjectUrl(String),

    /// Could not move the staged payload to its final location.
    #[error("Failed to save download to '{path}': {source}")]
    DownloadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the preview page.
    #[error("Failed to write preview to '{path}': {source}")]
    PreviewWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
