use serde::{Deserialize, Serialize};

/// Header carrying the percent-encoded original filename of an upload.
pub const FILENAME_HEADER: &str = "X-Airlift-Filename";

/// Header carrying the upload password for password-checked routes.
pub const PASSWORD_HEADER: &str = "X-Airlift-Password";

/// Marker header asking the server for a page fragment instead of a
/// full document.
pub const PARTIAL_HEADER: &str = "X-Ajax-Partial";

/// Upload route authenticated by [`PASSWORD_HEADER`].
pub const UPLOAD_FILE_PATH: &str = "/upload/file";

/// Upload route authenticated by the browser session cookie.
pub const UPLOAD_WEB_PATH: &str = "/upload/web";

/// Session login form.
pub const LOGIN_PATH: &str = "/-/login";

/// Full configuration view.
pub const CONFIG_PATH: &str = "/-/config";

/// Storage overview section of the configuration view.
pub const CONFIG_OVERVIEW_PATH: &str = "/-/config/overview";

/// Reports how many uploads a new size limit (MiB) would prune.
pub const CONFIG_SIZE_PATH: &str = "/-/config/size";

/// Reports how many uploads a new age limit (days) would prune.
pub const CONFIG_AGE_PATH: &str = "/-/config/age";

/// Upload history view.
pub const HISTORY_PATH: &str = "/-/history";

/// Prefix of the session-protected delete route, followed by the upload id.
pub const DELETE_PATH_PREFIX: &str = "/-/delete/";

/// Upload stored; body carries the locator.
pub const STATUS_CREATED: u16 = 201;

/// Action acknowledged with an empty body.
pub const STATUS_NO_CONTENT: u16 = 204;

/// Authentication required or rejected.
pub const STATUS_FORBIDDEN: u16 = 403;

/// Plain success, used by the prune-count endpoints.
pub const STATUS_OK: u16 = 200;

/// What a purge request deletes on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurgeScope {
    /// Every upload plus derived content.
    All,
    /// Derived content (thumbnails) only.
    Thumbs,
}

impl PurgeScope {
    /// Route that performs this purge.
    pub fn path(self) -> &'static str {
        match self {
            Self::All => "/purge/all",
            Self::Thumbs => "/purge/thumbs",
        }
    }
}

impl std::str::FromStr for PurgeScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "thumbs" => Ok(Self::Thumbs),
            other => Err(format!("unknown purge scope: {other}")),
        }
    }
}

/// Session-protected route deleting upload `id`.
pub fn session_delete_path(id: &str) -> String {
    format!("{DELETE_PATH_PREFIX}{id}")
}

/// Path of upload `id`; `DELETE` on it is password-checked.
pub fn upload_path(id: &str) -> String {
    format!("/{}", id.trim_start_matches('/'))
}
