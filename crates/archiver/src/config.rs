use std::time::Duration;

use cdr_core::error::CoreError;
use cdr_core::tier::Tier;

/// Default statement timeout for one copy batch.
const DEFAULT_COPY_TIMEOUT_SECS: u64 = 30 * 60;

/// Default statement timeout for one null batch.
const DEFAULT_NULL_TIMEOUT_SECS: u64 = 30 * 60;

/// Default pool size. Stages run sequentially.
const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Connection and timeout settings for one tier.
#[derive(Debug, Clone)]
pub struct ArchiverConfig {
    pub tier: Tier,
    /// Connection string for the database holding both version stores.
    pub database_url: String,
    /// Statement timeout applied to each copy batch.
    pub copy_timeout: Duration,
    /// Statement timeout applied to each null batch.
    pub null_timeout: Duration,
    /// Pool size.
    pub max_connections: u32,
}

impl ArchiverConfig {
    /// Load configuration for `tier` from environment variables.
    ///
    /// | Env Var                              | Default        |
    /// |--------------------------------------|----------------|
    /// | `CDR_<TIER>_DATABASE_URL`            | `DATABASE_URL` |
    /// | `CDR_<TIER>_ARCHIVE_DATABASE_URL`    | unset, or equal to the live URL |
    /// | `ARCHIVE_COPY_TIMEOUT_SECS`          | `1800`         |
    /// | `ARCHIVE_NULL_TIMEOUT_SECS`          | `1800`         |
    /// | `ARCHIVE_DB_MAX_CONNECTIONS`         | `4`            |
    pub fn from_env(tier: Tier) -> Result<Self, CoreError> {
        Self::from_lookup(tier, |key| std::env::var(key).ok())
    }

    /// Same as [`ArchiverConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(tier: Tier, lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = tier.env_prefix();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let live_key = format!("{prefix}_DATABASE_URL");
        let database_url = non_empty(&live_key)
            .or_else(|| non_empty("DATABASE_URL"))
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "no database URL for tier {tier}: set {live_key} or DATABASE_URL"
                ))
            })?;

        // Copy and null write the archive schema through the live connection,
        // so every archive read has to go through that same database.
        let archive_key = format!("{prefix}_ARCHIVE_DATABASE_URL");
        for key in [archive_key.as_str(), "ARCHIVE_DATABASE_URL"] {
            if let Some(url) = non_empty(key) {
                if url.trim() != database_url.trim() {
                    return Err(CoreError::Config(format!(
                        "{key} points at a different database than the live store; \
                         the archive schema must live in the tier's live database"
                    )));
                }
            }
        }

        let copy_timeout = Duration::from_secs(parse_or(
            &lookup,
            "ARCHIVE_COPY_TIMEOUT_SECS",
            DEFAULT_COPY_TIMEOUT_SECS,
        )?);
        let null_timeout = Duration::from_secs(parse_or(
            &lookup,
            "ARCHIVE_NULL_TIMEOUT_SECS",
            DEFAULT_NULL_TIMEOUT_SECS,
        )?);
        let max_connections = parse_or(
            &lookup,
            "ARCHIVE_DB_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(CoreError::Config(
                "ARCHIVE_DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            tier,
            database_url,
            copy_timeout,
            null_timeout,
            max_connections,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            CoreError::Config(format!("{key} must be a non-negative integer, got '{raw}'"))
        }),
    }
}
