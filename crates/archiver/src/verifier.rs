//! Confirms archived XML matches live XML before nulling is allowed.
//!
//! Every archived version whose live XML is still present is fetched from
//! both stores and compared exactly, in `(doc_id, num)` order. The first
//! mismatch stops the scan: one bad copy means the copy pass itself is
//! suspect.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::ArchiveError;
use crate::store::VersionStore;

/// Log progress after this many comparisons.
pub const PROGRESS_INTERVAL: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifySummary {
    /// Versions whose live and archived XML were compared and matched.
    pub compared: usize,
    /// Versions whose live XML was nulled after the scan was listed.
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Whether progress is logged after `seen` of `total` keys.
pub fn is_progress_checkpoint(seen: usize, total: usize) -> bool {
    seen > 0 && (seen % PROGRESS_INTERVAL == 0 || seen == total)
}

pub async fn verify_archived<S: VersionStore>(store: &S) -> Result<VerifySummary, ArchiveError> {
    let started = Instant::now();
    let keys = store.pending_verification().await?;
    let total = keys.len();
    tracing::info!(total, "Verifying archived version XML");

    let mut compared = 0usize;
    let mut skipped = 0usize;
    for (i, key) in keys.into_iter().enumerate() {
        match store.live_payload(key).await? {
            None => {
                tracing::debug!(%key, "Live XML already nulled, skipping");
                skipped += 1;
            }
            Some(live) => {
                let archived = store.archived_payload(key).await?;
                if archived.as_deref() != Some(live.as_str()) {
                    tracing::error!(
                        %key,
                        live_len = live.len(),
                        archived_len = archived.as_ref().map(String::len),
                        "Archived XML mismatch"
                    );
                    return Err(ArchiveError::Mismatch { key });
                }
                compared += 1;
            }
        }

        let seen = i + 1;
        if is_progress_checkpoint(seen, total) {
            tracing::info!(compared, seen, total, "Verification progress");
        }
    }

    let summary = VerifySummary {
        compared,
        skipped,
        elapsed: started.elapsed(),
    };
    tracing::info!(
        verified = summary.compared,
        skipped = summary.skipped,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Verified archived version XML"
    );
    Ok(summary)
}
