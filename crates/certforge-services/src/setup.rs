//! Wiring of the production collaborators from configuration.

use anyhow::Context;
use certforge_core::{Config, LinkShortener, NoOpNotifier, Notifier, PassthroughShortener};
use certforge_processing::{PdfCertificateRenderer, PdfiumPreviewDeriver};
use certforge_storage::create_storage;
use std::sync::Arc;

use crate::generator::{CertificateGenerator, GeneratorComponents};
use crate::notifier::EmailNotifier;
use crate::publisher::ArtifactPublisher;
use crate::shortener::BitlyShortener;

/// Build a generator backed by the configured storage, Bitly (when a token
/// is set), SMTP (when notifications are enabled), printpdf and pdfium.
pub async fn build_generator(config: &Config) -> anyhow::Result<CertificateGenerator> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = %storage.backend_type(), "Storage backend ready");

    let shortener: Arc<dyn LinkShortener> = match config.bitly_access_token() {
        Some(token) => Arc::new(
            BitlyShortener::new(
                config.bitly_api_url(),
                token,
                config.bitly_group_guid().map(String::from),
            )
            .context("Failed to initialize link shortener")?,
        ),
        None => {
            tracing::info!("BITLY_ACCESS_TOKEN not set, verification links stay unshortened");
            Arc::new(PassthroughShortener)
        }
    };

    let notifier: Arc<dyn Notifier> = if config.notifications_enabled() {
        Arc::new(
            EmailNotifier::smtp_from_config(config).context("Failed to initialize email notifier")?,
        )
    } else {
        tracing::info!(
            environment = %config.environment(),
            "Notifications disabled, certificates will not be emailed"
        );
        Arc::new(NoOpNotifier)
    };

    Ok(CertificateGenerator::new(
        config,
        GeneratorComponents {
            renderer: Arc::new(PdfCertificateRenderer::from_config(config)),
            deriver: Arc::new(PdfiumPreviewDeriver::from_config(config)),
            shortener,
            publisher: ArtifactPublisher::new(storage),
            notifier,
        },
    ))
}
