//! Retention limit changes.
//!
//! Runs as a [`TaskChain`]: the size limit preview first, then the age
//! limit preview. Each preview only asks the server when its limit got
//! tighter, and the chain carries the largest prune count seen so far.
//! [`update_retention`] appends a confirmation and commit step.

use std::future::Future;

use airlift_chain::{ChainError, StepFailure, TaskChain};
use airlift_protocol::constants::{CONFIG_AGE_PATH, CONFIG_SIZE_PATH};
use airlift_upload::UploadError;
use tracing::{debug, info};

use crate::admin::{ConfigForm, ConfigFragments};
use crate::client::Client;

/// Retention limits of a server. Zero means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionLimits {
    /// Maximum total storage, in MiB.
    pub max_size_mb: u32,
    /// Maximum upload age, in days.
    pub max_age_days: u32,
}

/// How a retention update ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionUpdate {
    /// The new limits were saved; carries the reloaded fragments.
    Committed {
        pruned: u32,
        fragments: ConfigFragments,
    },
    /// The caller refused to prune `pruned` uploads; nothing was saved.
    Declined { pruned: u32 },
}

/// Value carried from step to step.
#[derive(Debug, Default)]
struct Tally {
    pruned: u32,
    fragments: Option<ConfigFragments>,
}

/// Whether moving a limit from `old` to `new` can prune anything.
fn tightened(old: u32, new: u32) -> bool {
    new > 0 && (old == 0 || new < old)
}

/// Appends the size and age previews to `chain`.
fn append_previews<'a>(
    chain: &TaskChain<'a, Tally, UploadError>,
    client: &'a Client,
    current: RetentionLimits,
    proposed: RetentionLimits,
) -> Result<(), ChainError> {
    chain.append(move |mut tally: Tally| async move {
        if tightened(current.max_size_mb, proposed.max_size_mb) {
            let n = client
                .preview_prune(CONFIG_SIZE_PATH, proposed.max_size_mb)
                .await?;
            tally.pruned = tally.pruned.max(n);
        }
        Ok(tally)
    })?;
    chain.append(move |mut tally: Tally| async move {
        if tightened(current.max_age_days, proposed.max_age_days) {
            let n = client
                .preview_prune(CONFIG_AGE_PATH, proposed.max_age_days)
                .await?;
            tally.pruned = tally.pruned.max(n);
        }
        Ok(tally)
    })
}

async fn run_chain(mut chain: TaskChain<'_, Tally, UploadError>) -> Result<Tally, UploadError> {
    match chain.run(Tally::default()).await? {
        Ok(tally) => Ok(tally),
        Err(StepFailure { at, error }) => {
            debug!(step = at, error = %error, "retention chain stopped");
            Err(error)
        }
    }
}

/// Number of uploads the server would prune if `current` limits became
/// `proposed`. Returns 0 without any request when no limit got tighter.
pub async fn preview_retention(
    client: &Client,
    current: RetentionLimits,
    proposed: RetentionLimits,
) -> Result<u32, UploadError> {
    let chain = TaskChain::<Tally, UploadError>::new();
    append_previews(&chain, client, current, proposed)?;
    let tally = run_chain(chain).await?;
    debug!(pruned = tally.pruned, "retention preview");
    Ok(tally.pruned)
}

/// Previews the change from `current` to `proposed`, then saves `form` with
/// the proposed limits.
///
/// When the change would prune uploads, `confirm` is asked first with the
/// prune count; a refusal stops before anything is saved.
pub async fn update_retention<'a, C, Fut>(
    client: &'a Client,
    current: RetentionLimits,
    proposed: RetentionLimits,
    form: ConfigForm,
    confirm: C,
) -> Result<RetentionUpdate, UploadError>
where
    C: FnOnce(u32) -> Fut + Send + 'a,
    Fut: Future<Output = bool> + Send + 'a,
{
    let chain = TaskChain::<Tally, UploadError>::new();
    append_previews(&chain, client, current, proposed)?;
    chain.append(move |mut tally: Tally| async move {
        if tally.pruned > 0 && !confirm(tally.pruned).await {
            info!(pruned = tally.pruned, "retention change declined");
            return Ok(tally);
        }
        let form = form.with_limits(proposed);
        tally.fragments = Some(client.commit_config_and_refresh(&form).await?);
        Ok(tally)
    })?;

    let tally = run_chain(chain).await?;
    Ok(match tally.fragments {
        Some(fragments) => RetentionUpdate::Committed {
            pruned: tally.pruned,
            fragments,
        },
        None => RetentionUpdate::Declined {
            pruned: tally.pruned,
        },
    })
}
