//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod archive_version_repo;
pub mod live_version_repo;

pub use archive_version_repo::ArchiveVersionRepo;
pub use live_version_repo::LiveVersionRepo;
