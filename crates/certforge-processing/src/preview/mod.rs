//! Preview image module

pub mod deriver;

pub use deriver::{PdfiumPreviewDeriver, PreviewDeriver};
