use std::fmt;

use crate::error::UploadError;

/// Raw result of one exchange, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Absolute address of a stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Appends `name` as a trailing path segment, so the link carries the
    /// original filename.
    pub fn with_filename(&self, name: &str) -> Locator {
        let base = self.0.trim_end_matches('/');
        let name = name.trim_start_matches('/');
        if name.is_empty() {
            return self.clone();
        }
        Locator(format!("{base}/{name}"))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefix composed with the `host/id` fragment the server answers with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Origin(String);

impl Origin {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// `scheme://`, for servers answering with `host/id` fragments.
    pub fn from_scheme(scheme: &str) -> Self {
        Self(format!("{scheme}://"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the absolute locator for `fragment`.
    pub fn compose(&self, fragment: &str) -> Locator {
        let fragment = fragment.trim_start_matches('/');
        if self.0.is_empty() || self.0.ends_with('/') {
            Locator(format!("{}{fragment}", self.0))
        } else {
            Locator(format!("{}/{fragment}", self.0))
        }
    }
}

/// How a batch ended.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every file was stored; one locator per file, in input order.
    Completed(Vec<Locator>),
    /// A file was rejected or the exchange failed. Earlier locators are
    /// discarded.
    Failed(UploadError),
    AuthRequired,
    Cancelled,
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        match self {
            Self::Completed(locators) => BatchSummary::Completed {
                files: locators.len(),
            },
            Self::Failed(err) => BatchSummary::Failed {
                message: err.to_string(),
            },
            Self::AuthRequired => BatchSummary::AuthRequired,
            Self::Cancelled => BatchSummary::Cancelled,
        }
    }
}

/// Cloneable digest of a [`BatchOutcome`], carried by events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSummary {
    Completed { files: usize },
    Failed { message: String },
    AuthRequired,
    Cancelled,
}

/// Event emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// The batch claimed the active slot and is about to dispatch its first file.
    Started {
        batch: u64,
        files: usize,
        total_bytes: u64,
    },
    /// Batch-wide progress in `[0, 1]`.
    Progress { batch: u64, fraction: f64 },
    /// File `index` was stored.
    FileCompleted {
        batch: u64,
        index: usize,
        name: String,
        locator: Locator,
    },
    /// Terminal event; the active slot is already free.
    Finished { batch: u64, summary: BatchSummary },
}

impl UploadEvent {
    pub fn batch(&self) -> u64 {
        match self {
            Self::Started { batch, .. }
            | Self::Progress { batch, .. }
            | Self::FileCompleted { batch, .. }
            | Self::Finished { batch, .. } => *batch,
        }
    }
}
