use airlift_protocol::constants::UPLOAD_FILE_PATH;
use airlift_transfer::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

/// Connection settings for [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `scheme://host[:port]`, without a trailing path.
    pub base_url: String,
    /// Upload route, `/upload/file` for password-header uploads.
    pub upload_path: String,
    /// Sent in the password header on every request when set.
    pub password: Option<String>,
    /// Size of the body chunks streamed to the server.
    pub chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".into(),
            upload_path: UPLOAD_FILE_PATH.into(),
            password: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_upload_path(mut self, path: impl Into<String>) -> Self {
        self.upload_path = path.into();
        self
    }
}
