use std::fmt;

/// CDR document IDs are BIGINT in both stores.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifies one document version in both the live and the archive store.
///
/// Ordering is `(doc_id, num)`, the scan order used by every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionKey {
    pub doc_id: DbId,
    pub num: i32,
}

impl VersionKey {
    pub fn new(doc_id: DbId, num: i32) -> Self {
        Self { doc_id, num }
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CDR{:010}V{}", self.doc_id, self.num)
    }
}

/// Number of pending versions and the distinct documents they belong to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchivableCount {
    pub documents: i64,
    pub versions: i64,
}
