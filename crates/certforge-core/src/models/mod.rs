mod artifact;
mod certificate;

pub use artifact::{ArtifactPaths, BaseFilename, PublishedArtifactKeys, RenderDetails};
pub use certificate::{CertificateRequest, CertificateSource, Course, Delivery, Student};
