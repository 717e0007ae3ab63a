use cdr_core::error::CoreError;
use cdr_core::types::VersionKey;

/// Errors that end an archiver run.
///
/// Every variant is fatal for the process; transient batch failures are
/// absorbed by the batch engine and only surface here once the retry
/// budget is spent.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Bad arguments or configuration, detected before connecting.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error outside the retried batch statements.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Writing a report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Too many consecutive batch failures.
    #[error("{stage} aborted after {failures} consecutive batch failures: {source}")]
    RetriesExhausted {
        stage: &'static str,
        failures: u32,
        #[source]
        source: sqlx::Error,
    },

    /// The archived payload differs from the live payload.
    #[error("Archived XML does not match live XML for {key}")]
    Mismatch { key: VersionKey },

    /// Two archive stores do not hold the same set of versions.
    #[error(
        "Archive key sets differ at {first}: {local} local versions, {remote} source versions"
    )]
    KeySetsDiffer {
        first: VersionKey,
        local: usize,
        remote: usize,
    },

    /// Two archive stores hold different XML for some versions.
    #[error("{differing} archived versions differ between tiers")]
    ArchivesDiverge { differing: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mismatch_uses_cdr_key() {
        let err = ArchiveError::Mismatch {
            key: VersionKey::new(62902, 7),
        };
        assert_eq!(
            err.to_string(),
            "Archived XML does not match live XML for CDR0000062902V7"
        );
    }

    #[test]
    fn display_retries_exhausted() {
        let err = ArchiveError::RetriesExhausted {
            stage: "copy",
            failures: 6,
            source: sqlx::Error::PoolTimedOut,
        };
        let text = err.to_string();
        assert!(text.starts_with("copy aborted after 6 consecutive batch failures"));
    }

    #[test]
    fn core_error_is_transparent() {
        let err: ArchiveError = CoreError::Validation("bad".to_string()).into();
        assert_eq!(err.to_string(), "Validation failed: bad");
    }

    #[test]
    fn display_key_sets_differ() {
        let err = ArchiveError::KeySetsDiffer {
            first: VersionKey::new(62902, 3),
            local: 10,
            remote: 10,
        };
        assert_eq!(
            err.to_string(),
            "Archive key sets differ at CDR0000062902V3: 10 local versions, 10 source versions"
        );
    }
}
