use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Body of most server responses: either a locator or an error message.
///
/// Both fields are omitted when empty, so an acknowledged purge answers
/// with `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResponse {
    /// `host/id` fragment of a stored upload.
    #[serde(rename = "URL", default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(rename = "Err", default, skip_serializing_if = "String::is_empty")]
    pub err: String,
}

impl ServerResponse {
    /// Parses a raw body. An empty (or whitespace-only) body yields `None`.
    pub fn parse(body: &[u8]) -> Result<Option<Self>, ProtocolError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(body)?))
    }

    /// The error message, if the server sent a non-empty one.
    pub fn error_message(&self) -> Option<&str> {
        let msg = self.err.trim();
        (!msg.is_empty()).then_some(msg)
    }

    /// The locator fragment, if present.
    pub fn locator(&self) -> Option<&str> {
        let url = self.url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// Answer of the prune-count endpoints: how many uploads a limit would remove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneCount {
    #[serde(rename = "N", default)]
    pub n: u32,
}
