//! Batch sizing for the copy and null passes.

use crate::error::CoreError;

/// Rows per batch when copying payloads into the archive.
pub const DEFAULT_COPY_BATCH_SIZE: i64 = 500;

/// Rows per batch when nulling archived payloads in the live table.
pub const DEFAULT_NULL_BATCH_SIZE: i64 = 100;

/// Safety cap on successful batches per run.
pub const DEFAULT_MAX_BATCHES: i64 = 100_000;

/// Largest accepted batch. Bigger batches risk outrunning the statement
/// timeout and the transaction log.
pub const MAX_BATCH_SIZE: i64 = 100_000;

/// Validated batch parameters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Upper bound on rows touched by a single batch.
    pub batch_size: i64,
    /// Upper bound on successful batches in one run.
    pub max_batches: u64,
}

impl BatchSettings {
    pub fn new(batch_size: i64, max_batches: i64) -> Result<Self, CoreError> {
        validate_batch_size(batch_size)?;
        if max_batches < 1 {
            return Err(CoreError::Validation(format!(
                "max batches must be at least 1, got {max_batches}"
            )));
        }
        Ok(Self {
            batch_size,
            max_batches: max_batches as u64,
        })
    }
}

/// Validate that a batch size is within `1..=MAX_BATCH_SIZE`.
pub fn validate_batch_size(batch_size: i64) -> Result<(), CoreError> {
    if (1..=MAX_BATCH_SIZE).contains(&batch_size) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "batch size must be between 1 and {MAX_BATCH_SIZE}, got {batch_size}"
        )))
    }
}
