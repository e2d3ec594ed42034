//! lift configuration file.
//!
//! A small JSON file holding the connection details of the server:
//! - Linux: `$XDG_CONFIG_HOME/airlift/config.json` (or `~/.config/airlift/config.json`)
//! - Windows: `%APPDATA%\airlift\config.json`

use std::path::{Path, PathBuf};

use airlift_client::ClientConfig;
use airlift_protocol::constants::{UPLOAD_FILE_PATH, UPLOAD_WEB_PATH};
use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::ConnectionArgs;

/// Connection details persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftConfig {
    pub scheme: String,
    /// Host name, optionally followed by a path prefix.
    pub host: String,
    pub port: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            scheme: "http".into(),
            host: String::new(),
            port: "80".into(),
            password: None,
        }
    }
}

impl LiftConfig {
    /// Loads the file at `path`. A missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        match serde_json::from_str::<LiftConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Writes the file at `path`, readable by the owner only.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        set_permissions_0600(path);

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Applies command-line overrides. Returns whether anything changed.
    pub fn apply(&mut self, args: &ConnectionArgs) -> anyhow::Result<bool> {
        let before = self.clone();

        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = &args.port {
            self.port = port.clone();
        }
        if let Some(addr) = &args.addr {
            self.apply_addr(addr)?;
        }
        if let Some(password) = &args.password {
            self.password = (!password.is_empty()).then(|| password.clone());
        }
        if self.scheme.is_empty() {
            self.scheme = "http".into();
        }

        Ok(*self != before)
    }

    /// Sets scheme, host and port from a whole address. The scheme defaults
    /// to http and the port to the scheme's default. A path is kept as the
    /// host's prefix.
    pub fn apply_addr(&mut self, addr: &str) -> anyhow::Result<()> {
        let full = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        };
        let url = reqwest::Url::parse(&full).with_context(|| format!("invalid address {addr}"))?;
        let host = url
            .host_str()
            .with_context(|| format!("address {addr} has no host"))?;
        let prefix = url.path().trim_matches('/');

        self.scheme = url.scheme().to_string();
        self.host = if prefix.is_empty() {
            host.to_string()
        } else {
            format!("{host}/{prefix}")
        };
        self.port = url
            .port_or_known_default()
            .map(|p| p.to_string())
            .unwrap_or_default();
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }

    /// `scheme://host:port[/prefix]`.
    pub fn base_url(&self) -> String {
        let (host, prefix) = match self.host.split_once('/') {
            Some((host, prefix)) => (host, format!("/{}", prefix.trim_matches('/'))),
            None => (self.host.as_str(), String::new()),
        };
        if self.port.is_empty() {
            format!("{}://{host}{prefix}", self.scheme)
        } else {
            format!("{}://{host}:{}{prefix}", self.scheme, self.port)
        }
    }

    pub fn client_config(&self, web: bool) -> ClientConfig {
        let mut config = ClientConfig::new(self.base_url());
        config.password = self.password.clone();
        config.upload_path = if web { UPLOAD_WEB_PATH } else { UPLOAD_FILE_PATH }.into();
        config
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("airlift").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").context("APPDATA is not set")?;
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(xdg));
        }
        let home = std::env::var("HOME").context("HOME is not set")?;
        Ok(PathBuf::from(home).join(".config"))
    }
}
