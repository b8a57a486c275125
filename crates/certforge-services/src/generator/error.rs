use certforge_core::{CertificateError, ErrorMetadata, LogLevel};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Render,
    DeriveImage,
    Publish,
    Notify,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Extract,
        Stage::Render,
        Stage::DeriveImage,
        Stage::Publish,
        Stage::Notify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Render => "render",
            Stage::DeriveImage => "derive_image",
            Stage::Publish => "publish",
            Stage::Notify => "notify",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// First fatal error of a pipeline run and the stage that raised it.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: CertificateError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: CertificateError) -> Self {
        Self { stage, source }
    }

    /// Adapter for `map_err`.
    pub(crate) fn at(stage: Stage) -> impl FnOnce(CertificateError) -> Self {
        move |source| Self::new(stage, source)
    }
}

impl ErrorMetadata for PipelineError {
    fn error_code(&self) -> &'static str {
        self.source.error_code()
    }

    fn is_recoverable(&self) -> bool {
        self.source.is_recoverable()
    }

    fn log_level(&self) -> LogLevel {
        self.source.log_level()
    }
}
