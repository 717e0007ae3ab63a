//! Domain types and policies shared by the version archive tools.
//!
//! Nothing in this crate performs I/O; database access lives in `cdr-db`
//! and the batch jobs in `cdr-archiver`.

pub mod batch;
pub mod error;
pub mod retry;
pub mod tier;
pub mod types;
