//! certforge processing library
//!
//! The local stages of certificate generation:
//! - Detail extraction and base filename derivation (details)
//! - Layout and PDF emission (document)
//! - First-page JPEG preview (preview)

pub mod details;
#[cfg(feature = "document")]
pub mod document;
#[cfg(feature = "preview")]
pub mod preview;

pub use details::DetailExtractor;
#[cfg(feature = "document")]
pub use document::{CertificateAssets, DocumentRenderer, PdfCertificateRenderer, Signatory};
#[cfg(feature = "preview")]
pub use preview::{PdfiumPreviewDeriver, PreviewDeriver};
