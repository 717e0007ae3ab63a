//! Copies live version XML into the archive in bounded batches.
//!
//! Each batch selects the next archivable versions in `(doc_id, num)` order
//! and inserts them in one transaction. Copied versions stop being
//! archivable, so an interrupted run resumes where it left off.

use std::time::Duration;

use cdr_core::batch::BatchSettings;

use crate::batch::{BatchRunSummary, BatchRunner};
use crate::error::ArchiveError;
use crate::store::VersionStore;

pub const STAGE: &str = "copy";

/// Pause between committed copy batches.
pub const COPY_PAUSE: Duration = Duration::from_secs(1);

/// Batch runner configured for the copy pass.
pub fn runner(settings: BatchSettings) -> BatchRunner {
    BatchRunner::new(STAGE, settings, COPY_PAUSE)
}

/// Copy archivable versions until none remain or the batch cap is hit.
pub async fn copy_versions<S: VersionStore>(
    store: &S,
    runner: &BatchRunner,
) -> Result<BatchRunSummary, ArchiveError> {
    let summary = runner.run(|limit| store.copy_batch(limit)).await?;
    tracing::info!(
        copied = summary.rows,
        batches = summary.batches,
        "Copied version XML to archive"
    );
    Ok(summary)
}
