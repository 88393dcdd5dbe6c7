//! Document Source: the editable text buffer plus an optional attached file.
//!
//! When a file is attached it is what the server converts (via `/convert`);
//! the buffer is still sent alongside it and keeps driving the preview.

use std::path::{Path, PathBuf};

/// A file the user picked but that has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Display name, as shown in the "selected file" indicator and sent as
    /// the multipart filename.
    pub name: String,
    pub path: PathBuf,
}

impl FileHandle {
    /// Handle for a local path; the display name is the path's final component.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }
}

/// A selected file whose content has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl AttachedFile {
    /// The content decoded as text, invalid UTF-8 replaced with U+FFFD.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Current user input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSource {
    text: String,
    file: Option<AttachedFile>,
}

impl DocumentSource {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn file(&self) -> Option<&AttachedFile> {
        self.file.as_ref()
    }

    pub fn attach(&mut self, file: AttachedFile) {
        self.file = Some(file);
    }

    pub fn detach(&mut self) -> Option<AttachedFile> {
        self.file.take()
    }

    /// Nothing to convert: blank buffer and no file.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.file.is_none()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.file = None;
    }
}
