use std::path::PathBuf;

use airlift_protocol::PurgeScope;
use clap::{Args, Parser};

#[derive(Parser, Debug)]
#[command(name = "lift")]
#[command(about = "Upload files to an airlift server and print their URLs")]
#[command(after_help = "Pass '-' as a file to upload stdin.

Connection options are saved in the configuration file and reused by later
invocations. --addr sets the whole address, including scheme and optional
port, and overrides --host and --port.")]
pub struct Cli {
    /// Files to upload, in order ('-' reads stdin)
    pub files: Vec<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Name to upload the first file under
    #[arg(short = 'f', long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Name for the stdin upload
    #[arg(short = 's', long = "stdin-name", value_name = "NAME", default_value = "stdin")]
    pub stdin_name: String,

    /// Append the original filename to each returned URL
    #[arg(short = 'n', long)]
    pub include_name: bool,

    /// Do not show a progress bar
    #[arg(short = 'P', long)]
    pub no_progress: bool,

    /// Upload through the session-protected web route (logs in first)
    #[arg(long)]
    pub web: bool,

    #[command(flatten)]
    pub admin: AdminArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Server host name
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Server port
    #[arg(short = 'p', long)]
    pub port: Option<String>,

    /// Whole server address, e.g. https://files.example.com:8443
    #[arg(short = 'a', long = "addr", value_name = "URL")]
    pub addr: Option<String>,

    /// Upload password, stored in the configuration file
    #[arg(long)]
    pub password: Option<String>,

    /// Use this configuration file instead of the default one
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConnectionArgs {
    /// Whether any persisted setting was given.
    pub fn changes_config(&self) -> bool {
        self.host.is_some() || self.port.is_some() || self.addr.is_some() || self.password.is_some()
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct AdminArgs {
    /// Delete uploads on the server ('all') or only their thumbnails ('thumbs')
    #[arg(long, value_name = "SCOPE")]
    pub purge: Option<PurgeScope>,

    /// Report how many uploads a storage limit of MB would prune
    #[arg(long, value_name = "MB")]
    pub preview_size: Option<u32>,

    /// Report how many uploads an age limit of DAYS would prune
    #[arg(long, value_name = "DAYS")]
    pub preview_age: Option<u32>,

    /// Current storage limit in MB (0 = unlimited)
    #[arg(long, value_name = "MB", default_value_t = 0)]
    pub current_size: u32,

    /// Current age limit in days (0 = unlimited)
    #[arg(long, value_name = "DAYS", default_value_t = 0)]
    pub current_age: u32,

    /// Save the previewed limits on the server, asking first if uploads would be pruned
    #[arg(long)]
    pub commit: bool,

    /// Do not ask before pruning
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Configuration field to submit along with --commit (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Delete one upload by id (repeatable)
    #[arg(long = "delete", value_name = "ID")]
    pub delete: Vec<String>,
}

impl AdminArgs {
    pub fn requested(&self) -> bool {
        self.purge.is_some() || self.wants_preview() || self.commit || !self.delete.is_empty()
    }

    pub fn wants_preview(&self) -> bool {
        self.preview_size.is_some() || self.preview_age.is_some()
    }
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
