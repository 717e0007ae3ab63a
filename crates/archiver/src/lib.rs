//! `cdr-archiver` library crate.
//!
//! Moves immutable document version XML out of the live
//! `all_doc_versions` table into the version archive:
//!
//! 1. [`finder`] reports how much work is pending.
//! 2. [`copier`] copies archivable versions in bounded batches.
//! 3. [`verifier`] checks every archived copy against the live XML.
//! 4. [`nuller`] nulls live XML that the archive now holds.
//!
//! The binary entrypoint lives in `main.rs`.

pub mod batch;
pub mod cli;
pub mod compare;
pub mod config;
pub mod copier;
pub mod error;
pub mod finder;
pub mod nuller;
pub mod store;
pub mod verifier;

use std::io::{self, BufWriter};

use cdr_core::tier::Tier;
use cli::{Cli, Command};
use config::ArchiverConfig;
use error::ArchiveError;
use store::PgVersionStore;

/// Execute one CLI invocation.
///
/// Arguments and configuration are validated before any connection is
/// opened; connection failures are fatal and not retried.
pub async fn run(cli: Cli) -> Result<(), ArchiveError> {
    let tier = cli.tier;

    match cli.command {
        Command::Count => {
            let store = connect(tier).await?;
            let count = finder::count_archivable(&store).await?;
            println!("{} versions can be archived.", count.versions);
        }
        Command::Find => {
            let store = connect(tier).await?;
            let mut out = BufWriter::new(io::stdout().lock());
            let written = finder::write_archivable(&store, &mut out).await?;
            eprintln!("{written} versions");
        }
        Command::CountNullable => {
            let store = connect(tier).await?;
            let count = finder::count_nullable(&store).await?;
            println!("{} archived versions can be nulled.", count.versions);
        }
        Command::Copy(args) => {
            let runner = copier::runner(args.settings()?);
            let store = connect(tier).await?;
            copier::copy_versions(&store, &runner).await?;
        }
        Command::Verify => {
            let store = connect(tier).await?;
            let summary = verifier::verify_archived(&store).await?;
            println!(
                "verified {} in {:.3} seconds",
                summary.compared,
                summary.elapsed.as_secs_f64()
            );
        }
        Command::Null(args) => {
            let runner = nuller::runner(args.settings()?);
            let store = connect(tier).await?;
            nuller::null_archived(&store, &runner).await?;
        }
        Command::CompareArchives { source_tier } => {
            let local_config = ArchiverConfig::from_env(tier)?;
            let source_config = ArchiverConfig::from_env(source_tier)?;
            let local = PgVersionStore::connect(&local_config).await?;
            let source = PgVersionStore::connect(&source_config).await?;
            let summary = compare::compare_archives(&local, &source).await?;
            println!("{} archived versions match {source_tier}", summary.compared);
        }
    }

    tracing::info!("done");
    Ok(())
}

async fn connect(tier: Tier) -> Result<PgVersionStore, ArchiveError> {
    let config = ArchiverConfig::from_env(tier)?;
    PgVersionStore::connect(&config).await.map_err(|e| {
        tracing::error!(tier = %tier, error = %e, "Unable to connect to database");
        ArchiveError::from(e)
    })
}
