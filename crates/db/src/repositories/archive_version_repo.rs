//! Repository for the append-only `cdr_archived_versions.doc_version_xml`
//! table.

use std::time::Duration;

use cdr_core::types::VersionKey;
use sqlx::PgPool;

use crate::models::version::VersionKeyRow;
use crate::set_local_statement_timeout;

/// Copies the next batch of archivable versions in key order.
const COPY_BATCH: &str = "\
    INSERT INTO cdr_archived_versions.doc_version_xml (id, num, xml) \
    SELECT v.id, v.num, v.xml \
      FROM cdr.all_doc_versions v \
     WHERE v.xml IS NOT NULL \
       AND NOT EXISTS ( \
           SELECT 1 FROM cdr_archived_versions.doc_version_xml a \
            WHERE a.id = v.id AND a.num = v.num) \
     ORDER BY v.id, v.num \
     LIMIT $1";

/// Provides insert and read operations on archived versions.
pub struct ArchiveVersionRepo;

impl ArchiveVersionRepo {
    /// Copy up to `limit` archivable versions into the archive as one
    /// transaction. Must run on a connection that sees both schemas.
    /// Returns the number of rows copied.
    pub async fn copy_batch(
        pool: &PgPool,
        limit: i64,
        timeout: Duration,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        set_local_statement_timeout(&mut *tx, timeout).await?;

        let result = sqlx::query(COPY_BATCH)
            .bind(limit)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Fetch the archived payload of one version.
    pub async fn find_payload(
        pool: &PgPool,
        key: VersionKey,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT xml FROM cdr_archived_versions.doc_version_xml WHERE id = $1 AND num = $2",
        )
        .bind(key.doc_id)
        .bind(key.num)
        .fetch_optional(pool)
        .await
    }

    /// All archived keys in `(id, num)` order.
    pub async fn list_keys(pool: &PgPool) -> Result<Vec<VersionKey>, sqlx::Error> {
        let rows = sqlx::query_as::<_, VersionKeyRow>(
            "SELECT id AS doc_id, num FROM cdr_archived_versions.doc_version_xml ORDER BY id, num",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(VersionKey::from).collect())
    }
}
