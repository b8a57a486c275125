//! certforge storage library
//!
//! Storage abstraction for published certificate artifacts, with an S3
//! backend and a local filesystem backend.
//!
//! # Storage key format
//!
//! Keys mirror the artifact's path relative to the generator workspace, e.g.
//! `pdf/production/ada_lovelace_2024-01-10_systems_design.pdf`. Keys must not
//! be empty, contain a `..` segment, a backslash or a leading `/`. Validation
//! is centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use certforge_core::{ObjectAcl, StorageBackend};
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
