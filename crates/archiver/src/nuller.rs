//! Nulls live XML for versions already held by the archive.
//!
//! Run only after the verifier has passed. The scan is bounded below by the
//! creation time of the oldest nullable version, which keeps it off the
//! bulk of the live table whose XML was nulled in earlier runs. A version
//! is nulled only while its live XML still equals the archived copy.

use std::time::Duration;

use cdr_core::batch::BatchSettings;

use crate::batch::{BatchRunSummary, BatchRunner};
use crate::error::ArchiveError;
use crate::store::VersionStore;

pub const STAGE: &str = "null";

/// Pause between committed null batches.
pub const NULL_PAUSE: Duration = Duration::from_millis(200);

/// Batch runner configured for the null pass.
pub fn runner(settings: BatchSettings) -> BatchRunner {
    BatchRunner::new(STAGE, settings, NULL_PAUSE)
}

/// Null archived live XML until none remains or the batch cap is hit.
pub async fn null_archived<S: VersionStore>(
    store: &S,
    runner: &BatchRunner,
) -> Result<BatchRunSummary, ArchiveError> {
    let Some(cutoff) = store.nulling_cutoff().await? else {
        tracing::info!("No archived versions with live XML, nothing to null");
        return Ok(BatchRunSummary::default());
    };

    let settings = runner.settings();
    tracing::info!(
        cutoff = %cutoff,
        max_batches = settings.max_batches,
        batch_size = settings.batch_size,
        "Nulling archived version XML"
    );

    let summary = runner.run(|limit| store.null_batch(limit, cutoff)).await?;
    tracing::info!(
        nulled = summary.rows,
        batches = summary.batches,
        "Nulled archived version XML"
    );
    Ok(summary)
}
