//! Storage seam between the stages and the databases.
//!
//! Defines [`VersionStore`], the set of queries every stage needs, and
//! [`PgVersionStore`], its PostgreSQL implementation.

use std::future::Future;
use std::time::Duration;

use cdr_core::types::{ArchivableCount, Timestamp, VersionKey};
use cdr_db::repositories::{ArchiveVersionRepo, LiveVersionRepo};
use cdr_db::DbPool;
use futures::stream::BoxStream;

use crate::config::ArchiverConfig;

/// Queries and mutations over the live and archive version stores.
///
/// Mutating methods commit their own transaction; a returned `Ok` means the
/// batch is durable.
pub trait VersionStore: Send + Sync {
    /// Count archivable versions and the documents they belong to.
    fn count_archivable(
        &self,
    ) -> impl Future<Output = Result<ArchivableCount, sqlx::Error>> + Send;

    /// Stream archivable keys in `(doc_id, num)` order.
    fn archivable_keys(&self) -> BoxStream<'_, Result<VersionKey, sqlx::Error>>;

    /// Count archived versions whose live payload is still present.
    fn count_nullable(
        &self,
    ) -> impl Future<Output = Result<ArchivableCount, sqlx::Error>> + Send;

    /// Copy up to `limit` archivable versions in key order. Returns rows copied.
    fn copy_batch(&self, limit: i64) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;

    /// Archived keys whose live payload is still present, in key order.
    fn pending_verification(
        &self,
    ) -> impl Future<Output = Result<Vec<VersionKey>, sqlx::Error>> + Send;

    fn live_payload(
        &self,
        key: VersionKey,
    ) -> impl Future<Output = Result<Option<String>, sqlx::Error>> + Send;

    fn archived_payload(
        &self,
        key: VersionKey,
    ) -> impl Future<Output = Result<Option<String>, sqlx::Error>> + Send;

    /// Every archived key in key order.
    fn archived_keys(&self) -> impl Future<Output = Result<Vec<VersionKey>, sqlx::Error>> + Send;

    /// Creation time of the oldest nullable version, if any.
    fn nulling_cutoff(
        &self,
    ) -> impl Future<Output = Result<Option<Timestamp>, sqlx::Error>> + Send;

    /// Null up to `limit` nullable versions created at or after `cutoff`
    /// whose live payload equals the archived one. Returns rows nulled.
    fn null_batch(
        &self,
        limit: i64,
        cutoff: Timestamp,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

/// PostgreSQL-backed [`VersionStore`].
///
/// Both stores are schemas of one database, so every read and write,
/// including archive reads, goes through the same pool.
#[derive(Clone)]
pub struct PgVersionStore {
    pool: DbPool,
    copy_timeout: Duration,
    null_timeout: Duration,
}

impl PgVersionStore {
    pub fn new(pool: DbPool, copy_timeout: Duration, null_timeout: Duration) -> Self {
        Self {
            pool,
            copy_timeout,
            null_timeout,
        }
    }

    /// Open and health-check the pool. Failures are not retried.
    pub async fn connect(config: &ArchiverConfig) -> Result<Self, sqlx::Error> {
        let pool = cdr_db::create_pool(&config.database_url, config.max_connections).await?;
        cdr_db::health_check(&pool).await?;

        tracing::info!(tier = %config.tier, "Connected to version stores");

        Ok(Self::new(pool, config.copy_timeout, config.null_timeout))
    }
}

impl VersionStore for PgVersionStore {
    async fn count_archivable(&self) -> Result<ArchivableCount, sqlx::Error> {
        LiveVersionRepo::count_archivable(&self.pool).await
    }

    fn archivable_keys(&self) -> BoxStream<'_, Result<VersionKey, sqlx::Error>> {
        LiveVersionRepo::stream_archivable(&self.pool)
    }

    async fn count_nullable(&self) -> Result<ArchivableCount, sqlx::Error> {
        LiveVersionRepo::count_nullable(&self.pool).await
    }

    async fn copy_batch(&self, limit: i64) -> Result<u64, sqlx::Error> {
        ArchiveVersionRepo::copy_batch(&self.pool, limit, self.copy_timeout).await
    }

    async fn pending_verification(&self) -> Result<Vec<VersionKey>, sqlx::Error> {
        LiveVersionRepo::list_nullable(&self.pool).await
    }

    async fn live_payload(&self, key: VersionKey) -> Result<Option<String>, sqlx::Error> {
        LiveVersionRepo::find_payload(&self.pool, key).await
    }

    async fn archived_payload(&self, key: VersionKey) -> Result<Option<String>, sqlx::Error> {
        ArchiveVersionRepo::find_payload(&self.pool, key).await
    }

    async fn archived_keys(&self) -> Result<Vec<VersionKey>, sqlx::Error> {
        ArchiveVersionRepo::list_keys(&self.pool).await
    }

    async fn nulling_cutoff(&self) -> Result<Option<Timestamp>, sqlx::Error> {
        LiveVersionRepo::nulling_cutoff(&self.pool).await
    }

    async fn null_batch(&self, limit: i64, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        LiveVersionRepo::null_batch(&self.pool, limit, cutoff, self.null_timeout).await
    }
}
