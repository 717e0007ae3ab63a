//! Compares the archive of one tier against the archive of another.
//!
//! Used after a refresh to confirm a lower tier's archive matches the
//! source. Unlike the verifier this scans everything and reports every
//! differing version before failing.

use cdr_core::types::VersionKey;

use crate::error::ArchiveError;
use crate::store::VersionStore;
use crate::verifier::is_progress_checkpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareSummary {
    pub compared: usize,
}

pub async fn compare_archives<L, R>(local: &L, source: &R) -> Result<CompareSummary, ArchiveError>
where
    L: VersionStore,
    R: VersionStore,
{
    let local_keys = local.archived_keys().await?;
    let source_keys = source.archived_keys().await?;
    if let Some(first) = first_key_difference(&local_keys, &source_keys) {
        tracing::error!(
            %first,
            local = local_keys.len(),
            source = source_keys.len(),
            "Archived version keys do not match"
        );
        return Err(ArchiveError::KeySetsDiffer {
            first,
            local: local_keys.len(),
            remote: source_keys.len(),
        });
    }

    let total = local_keys.len();
    let mut differing = 0usize;
    for (i, key) in local_keys.into_iter().enumerate() {
        let ours = local.archived_payload(key).await?;
        let theirs = source.archived_payload(key).await?;
        if ours != theirs {
            tracing::warn!(%key, "Archived XML differs from source tier");
            differing += 1;
        }

        let compared = i + 1;
        if is_progress_checkpoint(compared, total) {
            tracing::info!(compared, total, "Comparison progress");
        }
    }

    if differing > 0 {
        return Err(ArchiveError::ArchivesDiverge { differing });
    }

    tracing::info!(compared = total, "Archives match");
    Ok(CompareSummary { compared: total })
}

/// Smallest key held by only one of two sorted key lists.
fn first_key_difference(local: &[VersionKey], source: &[VersionKey]) -> Option<VersionKey> {
    local
        .iter()
        .zip(source)
        .find(|(a, b)| a != b)
        .map(|(a, b)| *std::cmp::min(a, b))
        .or_else(|| {
            let common = local.len().min(source.len());
            local.get(common).or_else(|| source.get(common)).copied()
        })
}
