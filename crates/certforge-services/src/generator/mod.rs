//! Certificate generation pipeline
//!
//! Sequences extraction, rendering, preview derivation, publication and
//! notification for one certificate record. Every stage must finish before
//! the next starts and the first fatal error ends the run. Nothing is rolled
//! back: artifacts written before a failure stay on disk.
//!
//! Progress is persisted after each stage, so `resume` can continue a failed
//! run where it stopped instead of rendering again.

mod error;
mod locks;
mod progress;

pub use error::{PipelineError, Stage};
pub use locks::KeyLocks;
pub use progress::ProgressCursor;

use certforge_core::models::{
    ArtifactPaths, CertificateSource, PublishedArtifactKeys, RenderDetails,
};
use certforge_core::{
    CertificateResult, Config, LinkShortener, NotificationStatus, Notifier, ShortLink,
    ShortenOutcome,
};
use certforge_processing::{DetailExtractor, DocumentRenderer, PreviewDeriver};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::publisher::ArtifactPublisher;

/// Collaborators the pipeline delegates to.
pub struct GeneratorComponents {
    pub renderer: Arc<dyn DocumentRenderer>,
    pub deriver: Arc<dyn PreviewDeriver>,
    pub shortener: Arc<dyn LinkShortener>,
    pub publisher: ArtifactPublisher,
    pub notifier: Arc<dyn Notifier>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub keys: PublishedArtifactKeys,
    /// Link printed in the document footer.
    pub short_link: ShortLink,
    pub notification: NotificationStatus,
    /// Stages a resumed run found already done.
    pub skipped: Vec<Stage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Fresh,
    Resume,
}

/// Maps a record onto its rendering inputs and artifact locations.
#[derive(Debug, Clone)]
pub struct ArtifactPlanner {
    extractor: DetailExtractor,
    workspace_root: PathBuf,
    scoped_prefix: String,
}

impl ArtifactPlanner {
    pub fn from_config(config: &Config) -> Self {
        Self {
            extractor: DetailExtractor::new(config.verify_base_url()),
            workspace_root: config.workspace_root().to_path_buf(),
            scoped_prefix: config.scoped_output_prefix(),
        }
    }

    /// Artifact locations a record would be generated at. No side effects.
    pub fn plan(
        &self,
        source: &dyn CertificateSource,
    ) -> CertificateResult<(RenderDetails, ArtifactPaths)> {
        let (details, base) = self.extractor.extract(source)?;
        let paths = ArtifactPaths::new(&self.workspace_root, &self.scoped_prefix, base);
        Ok((details, paths))
    }
}

pub struct CertificateGenerator {
    planner: ArtifactPlanner,
    components: GeneratorComponents,
    locks: KeyLocks,
}

impl CertificateGenerator {
    pub fn new(config: &Config, components: GeneratorComponents) -> Self {
        Self {
            planner: ArtifactPlanner::from_config(config),
            components,
            locks: KeyLocks::new(),
        }
    }

    pub fn plan(
        &self,
        source: &dyn CertificateSource,
    ) -> CertificateResult<(RenderDetails, ArtifactPaths)> {
        self.planner.plan(source)
    }

    /// Run every stage from scratch and return the published keys.
    pub async fn generate(
        &self,
        source: &dyn CertificateSource,
    ) -> Result<PublishedArtifactKeys, PipelineError> {
        Ok(self.generate_with_report(source).await?.keys)
    }

    /// Run every stage from scratch. An earlier document for the same base
    /// filename is always overwritten.
    #[tracing::instrument(skip_all, fields(base = tracing::field::Empty))]
    pub async fn generate_with_report(
        &self,
        source: &dyn CertificateSource,
    ) -> Result<GenerationReport, PipelineError> {
        self.run(source, RunMode::Fresh).await
    }

    /// Continue the last run for this record from its first incomplete
    /// stage. Stages whose local artifact has gone missing run again.
    #[tracing::instrument(skip_all, fields(base = tracing::field::Empty))]
    pub async fn resume(
        &self,
        source: &dyn CertificateSource,
    ) -> Result<GenerationReport, PipelineError> {
        self.run(source, RunMode::Resume).await
    }

    async fn run(
        &self,
        source: &dyn CertificateSource,
        mode: RunMode,
    ) -> Result<GenerationReport, PipelineError> {
        let start = Instant::now();
        let (details, paths) = self.plan(source).map_err(PipelineError::at(Stage::Extract))?;
        tracing::Span::current().record("base", paths.base.as_str());

        let _guard = self.locks.acquire(paths.base.as_str()).await;

        let mut cursor = match mode {
            RunMode::Fresh => None,
            RunMode::Resume => ProgressCursor::load(&paths.progress_path)
                .await
                .map_err(PipelineError::at(Stage::Extract))?
                .filter(|c| c.base == paths.base && c.verify_url == details.verify_url),
        }
        .unwrap_or_else(|| ProgressCursor::new(paths.base.clone(), details.verify_url.clone()));

        let mut skipped = Vec::new();
        if cursor.is_done(Stage::Extract) {
            skipped.push(Stage::Extract);
        } else {
            cursor.complete(Stage::Extract);
            persist(&cursor, &paths.progress_path, Stage::Extract).await?;
        }

        let short_link = match cursor.short_link.clone() {
            Some(link) if cursor.is_done(Stage::Render) && paths.certificate_path.exists() => {
                skipped.push(Stage::Render);
                link
            }
            _ => {
                cursor.reset_from(Stage::Render);
                let link = self.render(&details, &paths).await?;
                cursor.complete(Stage::Render);
                cursor.short_link = Some(link.clone());
                persist(&cursor, &paths.progress_path, Stage::Render).await?;
                link
            }
        };

        if cursor.is_done(Stage::DeriveImage) && paths.image_path.exists() {
            skipped.push(Stage::DeriveImage);
        } else {
            cursor.reset_from(Stage::DeriveImage);
            self.timed(Stage::DeriveImage, async {
                self.components
                    .deriver
                    .derive(&paths.certificate_path, &paths.image_path)
                    .await
            })
            .await?;
            cursor.complete(Stage::DeriveImage);
            persist(&cursor, &paths.progress_path, Stage::DeriveImage).await?;
        }

        let keys = if cursor.is_done(Stage::Publish) {
            skipped.push(Stage::Publish);
            paths.keys()
        } else {
            let keys = self
                .timed(Stage::Publish, self.components.publisher.publish(&paths))
                .await?;
            cursor.complete(Stage::Publish);
            persist(&cursor, &paths.progress_path, Stage::Publish).await?;
            keys
        };

        let notification = match cursor.notification {
            Some(status) if cursor.is_done(Stage::Notify) => {
                skipped.push(Stage::Notify);
                status
            }
            _ => {
                let status = self
                    .timed(
                        Stage::Notify,
                        self.components.notifier.notify(&details, &paths),
                    )
                    .await?;
                cursor.complete(Stage::Notify);
                cursor.notification = Some(status);
                persist(&cursor, &paths.progress_path, Stage::Notify).await?;
                status
            }
        };

        tracing::info!(
            certificate_key = %keys.certificate_key,
            image_key = %keys.image_key,
            shortened = short_link.is_shortened(),
            notification = ?notification,
            skipped = skipped.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Certificate generated"
        );

        Ok(GenerationReport {
            keys,
            short_link,
            notification,
            skipped,
        })
    }

    /// Resolve the footer link, then render. A shortening failure only
    /// changes which URL is printed.
    async fn render(
        &self,
        details: &RenderDetails,
        paths: &ArtifactPaths,
    ) -> Result<ShortLink, PipelineError> {
        let link = self.components.shortener.shorten(&details.verify_url).await;
        if let ShortenOutcome::Fallback { reason } = &link.outcome {
            tracing::warn!(reason = %reason, url = %link.url, "Printing unshortened verification link");
        }

        self.timed(
            Stage::Render,
            self.components
                .renderer
                .render(details, &link.url, &paths.certificate_path),
        )
        .await?;
        Ok(link)
    }

    async fn timed<T, F>(&self, stage: Stage, fut: F) -> Result<T, PipelineError>
    where
        F: std::future::Future<Output = CertificateResult<T>>,
    {
        let start = Instant::now();
        tracing::debug!(stage = %stage, "Stage started");
        match fut.await {
            Ok(value) => {
                tracing::debug!(
                    stage = %stage,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Stage finished"
                );
                Ok(value)
            }
            Err(e) => {
                tracing::error!(stage = %stage, error = %e, "Stage failed");
                Err(PipelineError::new(stage, e))
            }
        }
    }
}

async fn persist(cursor: &ProgressCursor, path: &Path, stage: Stage) -> Result<(), PipelineError> {
    cursor.save(path).await.map_err(PipelineError::at(stage))
}
