//! certforge core library
//!
//! Domain models, configuration, error types and the collaborator traits
//! shared by every certforge crate.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{is_production_environment, Config, GeneratorConfig};
pub use error::{CertificateError, CertificateResult, ErrorMetadata, LogLevel};
pub use hooks::{
    LinkShortener, NoOpNotifier, NotificationStatus, Notifier, PassthroughShortener, ShortLink,
    ShortenOutcome,
};
pub use storage_types::{ObjectAcl, StorageBackend};
