//! Repository for the live `cdr.all_doc_versions` table.
//!
//! Rows are never inserted or deleted here. The only mutation is nulling the
//! `xml` column of versions whose payload already sits in the archive.

use std::time::Duration;

use cdr_core::types::{ArchivableCount, Timestamp, VersionKey};
use futures::stream::{BoxStream, StreamExt};
use sqlx::PgPool;

use crate::models::version::{CountRow, VersionKeyRow};
use crate::set_local_statement_timeout;

/// Versions with a payload that the archive does not hold yet.
const COUNT_ARCHIVABLE: &str = "\
    SELECT COUNT(DISTINCT v.id) AS documents, COUNT(*) AS versions \
      FROM cdr.all_doc_versions v \
     WHERE v.xml IS NOT NULL \
       AND NOT EXISTS ( \
           SELECT 1 FROM cdr_archived_versions.doc_version_xml a \
            WHERE a.id = v.id AND a.num = v.num)";

const LIST_ARCHIVABLE: &str = "\
    SELECT v.id AS doc_id, v.num \
      FROM cdr.all_doc_versions v \
     WHERE v.xml IS NOT NULL \
       AND NOT EXISTS ( \
           SELECT 1 FROM cdr_archived_versions.doc_version_xml a \
            WHERE a.id = v.id AND a.num = v.num) \
     ORDER BY v.id, v.num";

/// Versions already archived whose live payload is still present.
const COUNT_NULLABLE: &str = "\
    SELECT COUNT(DISTINCT v.id) AS documents, COUNT(*) AS versions \
      FROM cdr.all_doc_versions v \
      JOIN cdr_archived_versions.doc_version_xml a \
        ON a.id = v.id AND a.num = v.num \
     WHERE v.xml IS NOT NULL";

const LIST_NULLABLE: &str = "\
    SELECT v.id AS doc_id, v.num \
      FROM cdr.all_doc_versions v \
      JOIN cdr_archived_versions.doc_version_xml a \
        ON a.id = v.id AND a.num = v.num \
     WHERE v.xml IS NOT NULL \
     ORDER BY v.id, v.num";

const NULLING_CUTOFF: &str = "\
    SELECT MIN(v.dt) \
      FROM cdr.all_doc_versions v \
      JOIN cdr_archived_versions.doc_version_xml a \
        ON a.id = v.id AND a.num = v.num \
     WHERE v.xml IS NOT NULL";

/// Only rows whose live payload still equals the archived copy are nulled.
const NULL_BATCH: &str = "\
    UPDATE cdr.all_doc_versions dv \
       SET xml = NULL \
     WHERE (dv.id, dv.num) IN ( \
           SELECT v.id, v.num \
             FROM cdr.all_doc_versions v \
             JOIN cdr_archived_versions.doc_version_xml a \
               ON a.id = v.id AND a.num = v.num \
            WHERE v.dt >= $2 \
              AND v.xml IS NOT NULL \
              AND a.xml = v.xml \
            ORDER BY v.id, v.num \
            LIMIT $1)";

/// Provides read and null operations on live document versions.
pub struct LiveVersionRepo;

impl LiveVersionRepo {
    /// Count versions that still need to be copied to the archive.
    pub async fn count_archivable(pool: &PgPool) -> Result<ArchivableCount, sqlx::Error> {
        let row = sqlx::query_as::<_, CountRow>(COUNT_ARCHIVABLE)
            .fetch_one(pool)
            .await?;
        Ok(row.into())
    }

    /// Stream the keys of archivable versions in `(id, num)` order.
    pub fn stream_archivable(pool: &PgPool) -> BoxStream<'_, Result<VersionKey, sqlx::Error>> {
        sqlx::query_as::<_, VersionKeyRow>(LIST_ARCHIVABLE)
            .fetch(pool)
            .map(|row| row.map(VersionKey::from))
            .boxed()
    }

    /// Count archived versions whose live payload has not been nulled yet.
    pub async fn count_nullable(pool: &PgPool) -> Result<ArchivableCount, sqlx::Error> {
        let row = sqlx::query_as::<_, CountRow>(COUNT_NULLABLE)
            .fetch_one(pool)
            .await?;
        Ok(row.into())
    }

    /// Keys of archived versions whose live payload is still present, in
    /// `(id, num)` order.
    pub async fn list_nullable(pool: &PgPool) -> Result<Vec<VersionKey>, sqlx::Error> {
        let rows = sqlx::query_as::<_, VersionKeyRow>(LIST_NULLABLE)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(VersionKey::from).collect())
    }

    /// Fetch the live payload of one version. `None` when the row is missing
    /// or its payload has been nulled.
    pub async fn find_payload(
        pool: &PgPool,
        key: VersionKey,
    ) -> Result<Option<String>, sqlx::Error> {
        let payload = sqlx::query_scalar::<_, Option<String>>(
            "SELECT xml FROM cdr.all_doc_versions WHERE id = $1 AND num = $2",
        )
        .bind(key.doc_id)
        .bind(key.num)
        .fetch_optional(pool)
        .await?;
        Ok(payload.flatten())
    }

    /// Creation time of the oldest archived version still holding a live
    /// payload. `None` when nothing is left to null.
    pub async fn nulling_cutoff(pool: &PgPool) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<Timestamp>>(NULLING_CUTOFF)
            .fetch_one(pool)
            .await
    }

    /// Null the payload of up to `limit` archived versions created at or
    /// after `cutoff`, committed as one transaction. Returns the number of
    /// rows nulled.
    pub async fn null_batch(
        pool: &PgPool,
        limit: i64,
        cutoff: Timestamp,
        timeout: Duration,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        set_local_statement_timeout(&mut *tx, timeout).await?;

        let result = sqlx::query(NULL_BATCH)
            .bind(limit)
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
