//! Submission state and results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Whether a submission is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
}

/// What one successful conversion produced, before it is handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub filename: String,
    pub payload: Vec<u8>,
}

/// How a call to `on_submit` ended.
///
/// Failures are already reported to the user through the host's alert by the
/// time this is returned; callers use it for exit codes and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Nothing to convert; no request was sent.
    Rejected { message: String },
    /// The PDF was delivered to the host.
    Downloaded {
        filename: String,
        /// Where the host put the file.
        location: PathBuf,
        size: usize,
    },
    /// The request was sent and failed.
    Failed {
        message: String,
        /// HTTP status when the server answered.
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Downloaded { .. })
    }
}
