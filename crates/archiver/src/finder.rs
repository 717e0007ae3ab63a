//! Read-only reports on pending archive work.
//!
//! Database errors surface immediately; nothing here is retried.

use std::io::Write;

use cdr_core::types::ArchivableCount;
use futures::TryStreamExt;

use crate::error::ArchiveError;
use crate::store::VersionStore;

/// Count versions whose XML can be copied to the archive.
pub async fn count_archivable<S: VersionStore>(store: &S) -> Result<ArchivableCount, ArchiveError> {
    let count = store.count_archivable().await?;
    tracing::info!(
        documents = count.documents,
        versions = count.versions,
        "Versions that can be archived"
    );
    Ok(count)
}

/// Count archived versions whose live XML has not been nulled yet.
pub async fn count_nullable<S: VersionStore>(store: &S) -> Result<ArchivableCount, ArchiveError> {
    let count = store.count_nullable().await?;
    tracing::info!(
        documents = count.documents,
        versions = count.versions,
        "Archived versions that can be nulled"
    );
    Ok(count)
}

/// Write every archivable key to `out` as `doc_id<TAB>num` lines, in key
/// order, without holding the full list in memory. Returns the number of
/// keys written.
pub async fn write_archivable<S, W>(store: &S, out: &mut W) -> Result<u64, ArchiveError>
where
    S: VersionStore,
    W: Write,
{
    let mut keys = store.archivable_keys();
    let mut written = 0u64;
    while let Some(key) = keys.try_next().await? {
        writeln!(out, "{}\t{}", key.doc_id, key.num)?;
        written += 1;
    }
    out.flush()?;

    tracing::info!(versions = written, "Listed archivable versions");
    Ok(written)
}
