//! Row models for the version tables.

pub mod version;
