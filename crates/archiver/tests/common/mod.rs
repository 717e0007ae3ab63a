//! In-memory [`VersionStore`] used by the stage tests.
//!
//! Mirrors the eligibility rules of the SQL queries: ordered by key,
//! bounded by the batch limit, and nulling only rows whose live XML equals
//! the archived copy.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use cdr_archiver::store::VersionStore;
use cdr_core::types::{ArchivableCount, Timestamp, VersionKey};
use chrono::{TimeZone, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct LiveRow {
    dt: Timestamp,
    xml: Option<String>,
}

#[derive(Default)]
struct State {
    live: BTreeMap<VersionKey, LiveRow>,
    archive: BTreeMap<VersionKey, String>,
    /// Upcoming copy/null calls that should fail.
    failing_copies: u32,
    failing_nulls: u32,
    copy_attempts: Vec<Instant>,
    null_attempts: Vec<Instant>,
    batch_sizes: Vec<u64>,
    payload_reads: Vec<VersionKey>,
    /// Keys whose live XML is nulled right after the verifier lists them.
    nulled_after_listing: Vec<VersionKey>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

pub fn day(n: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, n, 12, 0, 0).unwrap()
}

pub fn key(doc_id: i64, num: i32) -> VersionKey {
    VersionKey::new(doc_id, num)
}

fn transient_failure() -> sqlx::Error {
    sqlx::Error::PoolTimedOut
}

fn count<'a>(keys: impl Iterator<Item = &'a VersionKey>) -> ArchivableCount {
    let keys: Vec<&VersionKey> = keys.collect();
    let mut docs: Vec<i64> = keys.iter().map(|k| k.doc_id).collect();
    docs.dedup();
    ArchivableCount {
        documents: docs.len() as i64,
        versions: keys.len() as i64,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_live(self, key: VersionKey, created: Timestamp, xml: Option<&str>) -> Self {
        self.state.lock().unwrap().live.insert(
            key,
            LiveRow {
                dt: created,
                xml: xml.map(str::to_string),
            },
        );
        self
    }

    pub fn with_archived(self, key: VersionKey, xml: &str) -> Self {
        self.set_archived(key, xml);
        self
    }

    pub fn set_archived(&self, key: VersionKey, xml: &str) {
        self.state
            .lock()
            .unwrap()
            .archive
            .insert(key, xml.to_string());
    }

    pub fn fail_next_copies(&self, n: u32) {
        self.state.lock().unwrap().failing_copies = n;
    }

    /// Simulate a concurrent null landing between listing and comparison.
    pub fn null_after_listing(&self, key: VersionKey) {
        self.state.lock().unwrap().nulled_after_listing.push(key);
    }

    pub fn fail_next_nulls(&self, n: u32) {
        self.state.lock().unwrap().failing_nulls = n;
    }

    pub fn live_xml(&self, key: VersionKey) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .live
            .get(&key)
            .and_then(|row| row.xml.clone())
    }

    pub fn archive(&self) -> BTreeMap<VersionKey, String> {
        self.state.lock().unwrap().archive.clone()
    }

    pub fn live_rows(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    pub fn copy_attempts(&self) -> Vec<Instant> {
        self.state.lock().unwrap().copy_attempts.clone()
    }

    pub fn null_attempts(&self) -> Vec<Instant> {
        self.state.lock().unwrap().null_attempts.clone()
    }

    /// Rows touched by each successful copy or null batch.
    pub fn batch_sizes(&self) -> Vec<u64> {
        self.state.lock().unwrap().batch_sizes.clone()
    }

    /// Keys whose live payload was read, in order.
    pub fn payload_reads(&self) -> Vec<VersionKey> {
        self.state.lock().unwrap().payload_reads.clone()
    }

    fn archivable(state: &State) -> Vec<VersionKey> {
        state
            .live
            .iter()
            .filter(|(k, row)| row.xml.is_some() && !state.archive.contains_key(k))
            .map(|(k, _)| *k)
            .collect()
    }

    fn nullable(state: &State) -> Vec<VersionKey> {
        state
            .live
            .iter()
            .filter(|(k, row)| row.xml.is_some() && state.archive.contains_key(k))
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn archivable_now(&self) -> Vec<VersionKey> {
        Self::archivable(&self.state.lock().unwrap())
    }

    pub fn nullable_now(&self) -> Vec<VersionKey> {
        Self::nullable(&self.state.lock().unwrap())
    }
}

impl VersionStore for MemoryStore {
    async fn count_archivable(&self) -> Result<ArchivableCount, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(count(Self::archivable(&state).iter()))
    }

    fn archivable_keys(&self) -> BoxStream<'_, Result<VersionKey, sqlx::Error>> {
        let keys = Self::archivable(&self.state.lock().unwrap());
        stream::iter(keys.into_iter().map(Ok)).boxed()
    }

    async fn count_nullable(&self) -> Result<ArchivableCount, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(count(Self::nullable(&state).iter()))
    }

    async fn copy_batch(&self, limit: i64) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        state.copy_attempts.push(Instant::now());
        if state.failing_copies > 0 {
            state.failing_copies -= 1;
            return Err(transient_failure());
        }

        let batch: Vec<VersionKey> = Self::archivable(&state)
            .into_iter()
            .take(limit as usize)
            .collect();
        for k in &batch {
            let xml = state.live[k].xml.clone().unwrap_or_default();
            state.archive.insert(*k, xml);
        }
        state.batch_sizes.push(batch.len() as u64);
        Ok(batch.len() as u64)
    }

    async fn pending_verification(&self) -> Result<Vec<VersionKey>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let keys = Self::nullable(&state);
        for k in std::mem::take(&mut state.nulled_after_listing) {
            if let Some(row) = state.live.get_mut(&k) {
                row.xml = None;
            }
        }
        Ok(keys)
    }

    async fn live_payload(&self, key: VersionKey) -> Result<Option<String>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        state.payload_reads.push(key);
        Ok(state.live.get(&key).and_then(|row| row.xml.clone()))
    }

    async fn archived_payload(&self, key: VersionKey) -> Result<Option<String>, sqlx::Error> {
        Ok(self.state.lock().unwrap().archive.get(&key).cloned())
    }

    async fn archived_keys(&self) -> Result<Vec<VersionKey>, sqlx::Error> {
        Ok(self.state.lock().unwrap().archive.keys().copied().collect())
    }

    async fn nulling_cutoff(&self) -> Result<Option<Timestamp>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(Self::nullable(&state)
            .iter()
            .map(|k| state.live[k].dt)
            .min())
    }

    async fn null_batch(&self, limit: i64, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        state.null_attempts.push(Instant::now());
        if state.failing_nulls > 0 {
            state.failing_nulls -= 1;
            return Err(transient_failure());
        }

        let batch: Vec<VersionKey> = Self::nullable(&state)
            .into_iter()
            .filter(|k| {
                let row = &state.live[k];
                row.dt >= cutoff && row.xml.as_ref() == state.archive.get(k)
            })
            .take(limit as usize)
            .collect();
        for k in &batch {
            if let Some(row) = state.live.get_mut(k) {
                row.xml = None;
            }
        }
        state.batch_sizes.push(batch.len() as u64);
        Ok(batch.len() as u64)
    }
}
