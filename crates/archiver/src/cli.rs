//! Command-line interface.

use clap::{Args, Parser, Subcommand};

use cdr_core::batch::{
    BatchSettings, DEFAULT_COPY_BATCH_SIZE, DEFAULT_MAX_BATCHES, DEFAULT_NULL_BATCH_SIZE,
};
use cdr_core::error::CoreError;
use cdr_core::tier::Tier;

/// Moves document version XML from the live CDR table into the version
/// archive, in four steps: count, copy, verify, null.
#[derive(Parser, Debug)]
#[command(name = "cdr-archiver", version, long_about = None)]
pub struct Cli {
    /// Tier whose databases to run against.
    #[arg(long, global = true, default_value = "PROD", value_name = "TIER")]
    pub tier: Tier,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count versions whose XML can be copied to the archive.
    Count,

    /// List archivable versions on stdout, one `doc_id<TAB>num` line each.
    Find,

    /// Count archived versions whose live XML can be nulled.
    CountNullable,

    /// Copy archivable version XML to the archive.
    Copy(CopyArgs),

    /// Check that archived XML matches live XML. Run before `null`.
    Verify,

    /// Null live XML for archived versions. Run `verify` first.
    Null(NullArgs),

    /// Compare this tier's archive with another tier's archive.
    CompareArchives {
        /// Tier holding the reference archive.
        #[arg(long, value_name = "TIER")]
        source_tier: Tier,
    },
}

#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Versions copied per batch.
    #[arg(long, default_value_t = DEFAULT_COPY_BATCH_SIZE)]
    pub batch_size: i64,

    /// Stop after this many batches.
    #[arg(long, default_value_t = DEFAULT_MAX_BATCHES)]
    pub max_batches: i64,
}

#[derive(Args, Debug)]
pub struct NullArgs {
    /// Versions nulled per batch.
    #[arg(long, default_value_t = DEFAULT_NULL_BATCH_SIZE)]
    pub batch_size: i64,

    /// Stop after this many batches.
    #[arg(long, default_value_t = DEFAULT_MAX_BATCHES)]
    pub max_batches: i64,
}

impl CopyArgs {
    pub fn settings(&self) -> Result<BatchSettings, CoreError> {
        BatchSettings::new(self.batch_size, self.max_batches)
    }
}

impl NullArgs {
    pub fn settings(&self) -> Result<BatchSettings, CoreError> {
        BatchSettings::new(self.batch_size, self.max_batches)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("cdr-archiver").chain(args.iter().copied()))
    }

    #[test]
    fn copy_defaults() {
        let cli = parse(&["copy"]).unwrap();
        assert_eq!(cli.tier, Tier::Prod);
        let Command::Copy(args) = cli.command else {
            panic!("expected copy command");
        };
        let settings = args.settings().unwrap();
        assert_eq!(settings.batch_size, 500);
        assert_eq!(settings.max_batches, 100_000);
    }

    #[test]
    fn null_defaults_to_smaller_batches() {
        let cli = parse(&["null"]).unwrap();
        let Command::Null(args) = cli.command else {
            panic!("expected null command");
        };
        assert_eq!(args.settings().unwrap().batch_size, 100);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&["copy", "--batch-size", "50", "--max-batches", "3", "--tier", "qa"])
            .unwrap();
        assert_eq!(cli.tier, Tier::Qa);
        let Command::Copy(args) = cli.command else {
            panic!("expected copy command");
        };
        let settings = args.settings().unwrap();
        assert_eq!(settings.batch_size, 50);
        assert_eq!(settings.max_batches, 3);
    }

    #[test]
    fn tier_before_subcommand() {
        let cli = parse(&["--tier", "DEV", "verify"]).unwrap();
        assert_eq!(cli.tier, Tier::Dev);
        assert_matches!(cli.command, Command::Verify);
    }

    #[test]
    fn unknown_tier_rejected() {
        assert!(parse(&["count", "--tier", "MOON"]).is_err());
    }

    #[test]
    fn zero_batch_size_fails_validation() {
        let cli = parse(&["null", "--batch-size", "0"]).unwrap();
        let Command::Null(args) = cli.command else {
            panic!("expected null command");
        };
        assert!(args.settings().is_err());
    }

    #[test]
    fn compare_requires_source_tier() {
        assert!(parse(&["compare-archives"]).is_err());
        let cli = parse(&["compare-archives", "--source-tier", "PROD", "--tier", "STAGE"]).unwrap();
        assert_eq!(cli.tier, Tier::Stage);
        assert_matches!(
            cli.command,
            Command::CompareArchives {
                source_tier: Tier::Prod
            }
        );
    }

    #[test]
    fn batch_flags_only_on_mutating_commands() {
        assert!(parse(&["verify", "--batch-size", "10"]).is_err());
        assert!(parse(&["count", "--max-batches", "10"]).is_err());
    }
}
