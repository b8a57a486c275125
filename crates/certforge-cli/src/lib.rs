use anyhow::Context;
use certforge_core::models::CertificateRequest;
use certforge_core::{is_production_environment, ErrorMetadata, LogLevel};
use certforge_services::{PipelineError, Stage};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the CLI. Events go to stderr so stdout stays
/// machine-readable; `json` switches to one JSON object per event.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("certforge=info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// `.env` files are a development convenience; production reads only the
/// real environment.
pub fn should_load_dotenv(environment: Option<&str>) -> bool {
    !environment.is_some_and(is_production_environment)
}

/// Machine-readable summary of a failed run, printed in place of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    pub stage: Stage,
    pub code: &'static str,
    /// A later `resume` may succeed.
    pub recoverable: bool,
    pub message: String,
}

impl FailureReport {
    pub fn from_error(err: &PipelineError) -> Self {
        Self {
            stage: err.stage,
            code: err.error_code(),
            recoverable: err.is_recoverable(),
            message: err.source.to_string(),
        }
    }
}

/// Log a failed run at the level its cause asks for.
pub fn log_pipeline_error(err: &PipelineError) {
    let stage = err.stage.as_str();
    let code = err.error_code();
    let recoverable = err.is_recoverable();
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %err, stage, code, recoverable, "Certificate run failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %err, stage, code, recoverable, "Certificate run failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %err, stage, code, recoverable, "Certificate run failed");
        }
    }
}

/// Read a certificate request from a JSON file.
pub fn load_request(path: &Path) -> anyhow::Result<CertificateRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid certificate request in {}", path.display()))
}
