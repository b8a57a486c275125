//! certforge services library
//!
//! Remote collaborators (link shortening, mail delivery, artifact
//! publication) and the generation pipeline that sequences them with the
//! local processing stages.

pub mod generator;
pub mod notifier;
pub mod publisher;
pub mod setup;
pub mod shortener;

pub use generator::{
    ArtifactPlanner, CertificateGenerator, GenerationReport, GeneratorComponents, PipelineError, ProgressCursor,
    Stage,
};
pub use notifier::{EmailNotifier, MailSettings};
pub use publisher::ArtifactPublisher;
pub use setup::build_generator;
pub use shortener::BitlyShortener;
