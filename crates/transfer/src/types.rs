use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::TransferError;

/// Where the bytes of an upload come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Already in memory (pasted data, stdin).
    Memory(Bytes),
    /// Streamed from disk when the request body is built.
    Path(PathBuf),
}

/// One file to upload: a name, its content and its declared size in bytes.
///
/// The declared size is what the batch progress is measured against. For
/// on-disk files it is read from the metadata when the descriptor is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    name: String,
    content: FileContent,
    size: u64,
}

impl FileDescriptor {
    /// Describes in-memory data.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            content: FileContent::Memory(data),
        }
    }

    /// Describes a regular file on disk, named after its last path component.
    pub fn from_path(path: &Path) -> Result<Self, TransferError> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(TransferError::NotAFile(path.display().to_string()));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TransferError::InvalidName(path.display().to_string()))?
            .to_string();

        Ok(Self {
            name,
            content: FileContent::Path(path.to_path_buf()),
            size: meta.len(),
        })
    }

    /// Replaces the name sent to the server.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &FileContent {
        &self.content
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Sum of the declared sizes of `files`.
pub fn total_size(files: &[FileDescriptor]) -> u64 {
    files.iter().fold(0u64, |acc, f| acc.saturating_add(f.size))
}
