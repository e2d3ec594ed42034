mod admin;
mod cli;
mod config;
mod progress;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use airlift_client::Client;
use airlift_transfer::{FileDescriptor, total_size};
use airlift_upload::{BatchOutcome, Locator, UploadError, UploadOrchestrator};
use anyhow::{Context, bail};
use clap::{CommandFactory, Parser};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::LiftConfig;

/// Exit status for an upload the server refused without a valid password.
const EXIT_AUTH: u8 = 2;
/// Exit status after Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            if matches!(e.downcast_ref::<UploadError>(), Some(UploadError::AuthRequired)) {
                eprintln!("lift: {e:#}");
                eprintln!("The server needs a valid password; set it with --password.");
                return ExitCode::from(EXIT_AUTH);
            }
            eprintln!("lift: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = match &cli.connection.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    let mut conf = LiftConfig::load(&config_path)?;
    let configured = cli.connection.changes_config() && conf.apply(&cli.connection)?;
    if configured {
        conf.save(&config_path)?;
        info!(path = %config_path.display(), "configuration updated");
    }

    if cli.files.is_empty() && !cli.admin.requested() {
        if cli.connection.changes_config() {
            return Ok(ExitCode::SUCCESS);
        }
        Cli::command().print_help()?;
        return Ok(ExitCode::FAILURE);
    }
    if !conf.is_configured() {
        bail!("host not configured; pass --host or --addr");
    }

    let client = Arc::new(Client::new(conf.client_config(cli.web))?);

    if cli.web || cli.admin.requested() {
        if let Some(password) = conf.password.as_deref() {
            client.login(password).await.context("logging in")?;
        }
    }

    if cli.admin.requested() {
        admin::run(&client, &cli.admin, cli.web).await?;
    }

    if cli.files.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    upload(client, &cli).await
}

/// Builds the upload list from the command line, in order.
async fn collect_files(cli: &Cli) -> anyhow::Result<Vec<FileDescriptor>> {
    let mut files = Vec::with_capacity(cli.files.len());
    for arg in &cli.files {
        if arg == "-" {
            let mut data = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .context("buffering stdin")?;
            files.push(FileDescriptor::from_bytes(cli.stdin_name.clone(), data));
        } else {
            let file = FileDescriptor::from_path(Path::new(arg))
                .with_context(|| format!("opening {arg}"))?;
            files.push(file);
        }
    }

    if let (Some(name), Some(first)) = (&cli.name, files.first_mut()) {
        *first = first.clone().with_name(name.clone());
    }
    Ok(files)
}

async fn upload(client: Arc<Client>, cli: &Cli) -> anyhow::Result<ExitCode> {
    let files = collect_files(cli).await?;
    let names: Vec<String> = files.iter().map(|f| f.name().to_string()).collect();
    let show_bar = !cli.no_progress && total_size(&files) > progress::BAR_THRESHOLD;

    let mut orchestrator = UploadOrchestrator::new(client.clone(), client.origin().clone());
    let events = orchestrator
        .take_events()
        .context("upload events already taken")?;
    let renderer = tokio::spawn(progress::render(events, show_bar));

    let batch = orchestrator.begin(files)?;
    let cancel = batch.cancel_handle();
    let run = batch.run();
    tokio::pin!(run);

    let outcome = tokio::select! {
        outcome = &mut run => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, cancelling upload");
            cancel.cancel();
            run.await
        }
    };

    drop(orchestrator);
    let _ = renderer.await;

    match outcome {
        BatchOutcome::Completed(locators) => {
            for line in output_lines(&locators, &names, cli.include_name) {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
        BatchOutcome::AuthRequired => {
            eprintln!("lift: authentication required");
            eprintln!("The server needs a valid password; set it with --password.");
            Ok(ExitCode::from(EXIT_AUTH))
        }
        BatchOutcome::Failed(e) => {
            eprintln!("lift: server returned error: {e}");
            Ok(ExitCode::FAILURE)
        }
        BatchOutcome::Cancelled => {
            eprintln!("lift: upload cancelled");
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
    }
}

/// URLs to print, one per uploaded file.
fn output_lines(locators: &[Locator], names: &[String], include_name: bool) -> Vec<String> {
    locators
        .iter()
        .zip(names)
        .map(|(locator, name)| {
            if include_name {
                locator.with_filename(name).into_string()
            } else {
                locator.to_string()
            }
        })
        .collect()
}
