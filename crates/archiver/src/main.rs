//! `cdr-archiver` -- version XML archive maintenance.
//!
//! Each subcommand is a short sequential batch job against one tier's
//! databases. See `cdr-archiver --help` for the stages and their flags.
//!
//! # Environment variables
//!
//! | Variable                           | Required | Default | Description                    |
//! |------------------------------------|----------|---------|--------------------------------|
//! | `CDR_<TIER>_DATABASE_URL`          | yes*     | --      | Live store for the tier        |
//! | `DATABASE_URL`                     | yes*     | --      | Fallback live store            |
//! | `CDR_<TIER>_ARCHIVE_DATABASE_URL`  | no       | --      | Must match the live URL if set |
//! | `ARCHIVE_DATABASE_URL`             | no       | --      | Must match the live URL if set |
//! | `ARCHIVE_COPY_TIMEOUT_SECS`        | no       | `1800`  | Statement timeout per copy batch |
//! | `ARCHIVE_NULL_TIMEOUT_SECS`        | no       | `1800`  | Statement timeout per null batch |
//! | `ARCHIVE_DB_MAX_CONNECTIONS`       | no       | `4`     | Pool size                      |
//!
//! \* one of the two must be set.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cdr_archiver::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cdr_archiver=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cdr_archiver::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, detail = ?e, "cdr-archiver failed");
            ExitCode::FAILURE
        }
    }
}
