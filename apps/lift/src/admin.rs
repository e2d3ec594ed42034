use airlift_client::{
    Client, ConfigForm, RetentionLimits, RetentionUpdate, preview_retention, update_retention,
};
use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::cli::AdminArgs;

/// Runs the admin requests of `args` on a logged-in client. `web` deletes
/// through the session route instead of the password one.
pub async fn run(client: &Client, args: &AdminArgs, web: bool) -> anyhow::Result<()> {
    if args.commit && !args.wants_preview() {
        bail!("--commit needs --preview-size or --preview-age");
    }

    for id in &args.delete {
        if web {
            client
                .delete_from_history(id)
                .await
                .with_context(|| format!("deleting {id}"))?;
        } else {
            client
                .delete_upload(id)
                .await
                .with_context(|| format!("deleting {id}"))?;
        }
        info!(id = %id, "upload deleted");
        println!("deleted {id}");
    }

    if let Some(scope) = args.purge {
        let overview = client
            .purge_and_refresh(scope)
            .await
            .with_context(|| format!("purging {scope:?}"))?;
        info!(scope = ?scope, "purge complete");
        println!("{}", overview.trim());
    }

    if args.wants_preview() {
        let current = RetentionLimits {
            max_size_mb: args.current_size,
            max_age_days: args.current_age,
        };
        let proposed = RetentionLimits {
            max_size_mb: args.preview_size.unwrap_or(args.current_size),
            max_age_days: args.preview_age.unwrap_or(args.current_age),
        };

        if !args.commit {
            let pruned = preview_retention(client, current, proposed)
                .await
                .context("previewing retention limits")?;
            println!("{}", describe_prune(pruned));
            return Ok(());
        }

        let mut form = ConfigForm::new();
        for (key, value) in &args.fields {
            form.set(key.as_str(), value.as_str());
        }
        let yes = args.yes;
        let update = update_retention(client, current, proposed, form, move |pruned| async move {
            yes || confirm_prune(pruned).await
        })
        .await
        .context("saving retention limits")?;

        match update {
            RetentionUpdate::Committed { pruned, fragments } => {
                info!(pruned, "retention limits saved");
                println!("{}", fragments.overview.trim());
            }
            RetentionUpdate::Declined { pruned } => {
                println!("limits unchanged, {}", describe_prune(pruned));
            }
        }
    }

    Ok(())
}

/// Asks on the terminal whether pruning `pruned` uploads is fine.
async fn confirm_prune(pruned: u32) -> bool {
    let mut stderr = tokio::io::stderr();
    let prompt = format!("{}. Save the new limits? [y/N] ", describe_prune(pruned));
    if stderr.write_all(prompt.as_bytes()).await.is_err() {
        return false;
    }
    let _ = stderr.flush().await;

    let mut answer = String::new();
    match BufReader::new(tokio::io::stdin()).read_line(&mut answer).await {
        Ok(_) => accepts(&answer),
        Err(e) => {
            warn!(error = %e, "could not read confirmation");
            false
        }
    }
}

fn accepts(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn describe_prune(pruned: u32) -> String {
    match pruned {
        0 => "no uploads would be pruned".to_string(),
        1 => "1 upload would be pruned".to_string(),
        n => format!("{n} uploads would be pruned"),
    }
}
