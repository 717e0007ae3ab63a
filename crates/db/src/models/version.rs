//! Row shapes returned by the version queries.

use cdr_core::types::{ArchivableCount, DbId, VersionKey};
use sqlx::FromRow;

/// The `(id, num)` key of a row in either store.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct VersionKeyRow {
    pub doc_id: DbId,
    pub num: i32,
}

impl From<VersionKeyRow> for VersionKey {
    fn from(row: VersionKeyRow) -> Self {
        VersionKey::new(row.doc_id, row.num)
    }
}

/// Result of the pending-work counting queries.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CountRow {
    pub documents: i64,
    pub versions: i64,
}

impl From<CountRow> for ArchivableCount {
    fn from(row: CountRow) -> Self {
        ArchivableCount {
            documents: row.documents,
            versions: row.versions,
        }
    }
}
