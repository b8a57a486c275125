//! Collaborator traits for the generation pipeline
//!
//! The orchestrator talks to link shortening and recipient notification only
//! through these traits, so deployments (and tests) choose the backing
//! implementation at setup time. No-op implementations live here as well.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CertificateResult;
use crate::models::{ArtifactPaths, RenderDetails};

/// How a verification link was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShortenOutcome {
    Shortened,
    /// The original URL is used unchanged.
    Fallback { reason: String },
}

/// Verification link to embed in a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub url: String,
    #[serde(flatten)]
    pub outcome: ShortenOutcome,
}

impl ShortLink {
    pub fn shortened(url: impl Into<String>) -> Self {
        ShortLink {
            url: url.into(),
            outcome: ShortenOutcome::Shortened,
        }
    }

    pub fn fallback(original: impl Into<String>, reason: impl Into<String>) -> Self {
        ShortLink {
            url: original.into(),
            outcome: ShortenOutcome::Fallback {
                reason: reason.into(),
            },
        }
    }

    pub fn is_shortened(&self) -> bool {
        matches!(self.outcome, ShortenOutcome::Shortened)
    }
}

/// Turns long verification URLs into short ones.
///
/// Implementations never fail: any problem with the remote service yields
/// `ShortLink::fallback` carrying the untouched input.
#[async_trait]
pub trait LinkShortener: Send + Sync {
    async fn shorten(&self, long_url: &str) -> ShortLink;
}

/// Shortener used when no shortening service is configured.
pub struct PassthroughShortener;

#[async_trait]
impl LinkShortener for PassthroughShortener {
    async fn shorten(&self, long_url: &str) -> ShortLink {
        ShortLink::fallback(long_url, "link shortening disabled")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Skipped,
}

/// Delivers a finished certificate to its recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        details: &RenderDetails,
        paths: &ArtifactPaths,
    ) -> CertificateResult<NotificationStatus>;
}

/// Notifier for test-like contexts and deployments without mail delivery.
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(
        &self,
        _details: &RenderDetails,
        paths: &ArtifactPaths,
    ) -> CertificateResult<NotificationStatus> {
        tracing::debug!(base = %paths.base, "Notification skipped");
        Ok(NotificationStatus::Skipped)
    }
}
