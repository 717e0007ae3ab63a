//! Bounded batch loop shared by the copy and null passes.
//!
//! [`BatchRunner::run`] calls an "apply one batch" operation until a batch
//! touches no rows or the batch cap is reached. Failed batches are retried
//! according to a [`RetryPolicy`]; each committed batch is logged and
//! followed by a short pause to limit contention with live traffic.

use std::future::Future;
use std::time::Duration;

use cdr_core::batch::BatchSettings;
use cdr_core::retry::{RetryDecision, RetryPolicy, RetryState};
use tokio::time::Instant;

use crate::error::ArchiveError;

/// Totals for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchRunSummary {
    /// Committed batches, including a final empty one.
    pub batches: u64,
    /// Rows touched across all committed batches.
    pub rows: u64,
    /// Failed attempts that were retried.
    pub failures: u32,
}

pub struct BatchRunner {
    stage: &'static str,
    settings: BatchSettings,
    policy: RetryPolicy,
    pause: Duration,
}

impl BatchRunner {
    pub fn new(stage: &'static str, settings: BatchSettings, pause: Duration) -> Self {
        Self {
            stage,
            settings,
            policy: RetryPolicy::default(),
            pause,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn settings(&self) -> BatchSettings {
        self.settings
    }

    /// Drive `apply` until the work runs out or the batch cap is hit.
    ///
    /// `apply` receives the batch size and returns the number of rows it
    /// committed.
    pub async fn run<F, Fut>(&self, mut apply: F) -> Result<BatchRunSummary, ArchiveError>
    where
        F: FnMut(i64) -> Fut,
        Fut: Future<Output = Result<u64, sqlx::Error>>,
    {
        let stage = self.stage;
        let mut retry = RetryState::new(self.policy);
        let mut summary = BatchRunSummary::default();

        tracing::info!(
            stage,
            batch_size = self.settings.batch_size,
            max_batches = self.settings.max_batches,
            "Starting batch run"
        );

        while summary.batches < self.settings.max_batches {
            let started = Instant::now();
            let rows = match apply(self.settings.batch_size).await {
                Ok(rows) => rows,
                Err(e) => match retry.record_failure() {
                    RetryDecision::Retry(delay) => {
                        tracing::warn!(
                            stage,
                            error = %e,
                            failures = retry.consecutive_failures(),
                            backoff_secs = delay.as_secs(),
                            "Batch failed, retrying after backoff"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    RetryDecision::Abort => {
                        tracing::error!(
                            stage,
                            error = %e,
                            failures = retry.consecutive_failures(),
                            "Batch failed, giving up"
                        );
                        return Err(ArchiveError::RetriesExhausted {
                            stage,
                            failures: retry.consecutive_failures(),
                            source: e,
                        });
                    }
                },
            };

            retry.record_success();
            summary.batches += 1;
            summary.rows += rows;

            tracing::info!(
                stage,
                batch = summary.batches,
                rows,
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Batch committed"
            );

            if rows == 0 {
                break;
            }
            tokio::time::sleep(self.pause).await;
        }

        summary.failures = retry.total_failures();
        tracing::info!(
            stage,
            batches = summary.batches,
            rows = summary.rows,
            failures = summary.failures,
            "Batch run done"
        );
        Ok(summary)
    }
}
