//! Document rendering module

pub mod layout;
pub mod metrics;
pub mod renderer;

pub use layout::{layout_certificate, FontMetrics, PlacedLine, Signatory};
pub use metrics::LoadedFont;
pub use renderer::{CertificateAssets, DocumentRenderer, PdfCertificateRenderer};
