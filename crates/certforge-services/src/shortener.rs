//! Bitly link shortener
//!
//! Calls the Bitly v4 `shorten` endpoint. Every failure degrades to the
//! original URL; the caller sees why through `ShortenOutcome::Fallback`.

use async_trait::async_trait;
use certforge_core::{CertificateError, CertificateResult, LinkShortener, ShortLink};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum ShortenError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("response has no link")]
    MissingLink,
}

#[derive(Serialize)]
struct ShortenRequest<'a> {
    long_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_guid: Option<&'a str>,
}

#[derive(Deserialize)]
struct ShortenResponse {
    link: Option<String>,
}

/// Bitly v4 client.
pub struct BitlyShortener {
    http_client: reqwest::Client,
    api_url: String,
    access_token: String,
    group_guid: Option<String>,
}

impl BitlyShortener {
    /// `api_url` is the API root, e.g. `https://api-ssl.bitly.com/v4`.
    pub fn new(
        api_url: impl Into<String>,
        access_token: impl Into<String>,
        group_guid: Option<String>,
    ) -> CertificateResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CertificateError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            group_guid,
        })
    }

    async fn request_short_link(&self, long_url: &str) -> Result<String, ShortenError> {
        let response = self
            .http_client
            .post(format!("{}/shorten", self.api_url))
            .bearer_auth(&self.access_token)
            .json(&ShortenRequest {
                long_url,
                group_guid: self.group_guid.as_deref(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShortenError::Status { status, body });
        }

        let parsed: ShortenResponse = response.json().await?;
        parsed
            .link
            .filter(|link| !link.trim().is_empty())
            .ok_or(ShortenError::MissingLink)
    }
}

#[async_trait]
impl LinkShortener for BitlyShortener {
    async fn shorten(&self, long_url: &str) -> ShortLink {
        match self.request_short_link(long_url).await {
            Ok(link) => {
                tracing::debug!(long_url = %long_url, short_url = %link, "Verification link shortened");
                ShortLink::shortened(link)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    long_url = %long_url,
                    "Link shortening failed, using original URL"
                );
                ShortLink::fallback(long_url, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certforge_core::ShortenOutcome;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_shortened_link_on_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/shorten")
            .match_header("authorization", "Bearer secret-token")
            .match_body(Matcher::Json(serde_json::json!({
                "long_url": "http://host/verify/abc123",
                "group_guid": "Ba1bc23dE4F"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"link": "https://bit.ly/3xYz", "id": "bit.ly/3xYz"}"#)
            .create_async()
            .await;

        let shortener = BitlyShortener::new(
            server.url(),
            "secret-token",
            Some("Ba1bc23dE4F".to_string()),
        )
        .unwrap();
        let link = shortener.shorten("http://host/verify/abc123").await;

        mock.assert_async().await;
        assert_eq!(link, ShortLink::shortened("https://bit.ly/3xYz"));
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/shorten")
            .with_status(500)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let shortener = BitlyShortener::new(server.url(), "t", None).unwrap();
        let link = shortener.shorten("http://host/verify/abc123").await;

        assert_eq!(link.url, "http://host/verify/abc123");
        match link.outcome {
            ShortenOutcome::Fallback { reason } => assert!(reason.contains("500"), "{reason}"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/shorten")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{not json")
            .create_async()
            .await;

        let shortener = BitlyShortener::new(server.url(), "t", None).unwrap();
        let link = shortener.shorten("http://host/verify/abc123").await;

        assert!(!link.is_shortened());
        assert_eq!(link.url, "http://host/verify/abc123");
    }

    #[tokio::test]
    async fn test_response_without_link_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/shorten")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "bit.ly/3xYz"}"#)
            .create_async()
            .await;

        let shortener = BitlyShortener::new(server.url(), "t", None).unwrap();
        let link = shortener.shorten("http://host/verify/abc123").await;

        assert_eq!(
            link.outcome,
            ShortenOutcome::Fallback {
                reason: "response has no link".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        // Nothing listens on port 9 (discard) in test environments.
        let shortener = BitlyShortener::new("http://127.0.0.1:9", "t", None).unwrap();
        let link = shortener.shorten("http://host/verify/abc123").await;
        assert_eq!(link.url, "http://host/verify/abc123");
        assert!(!link.is_shortened());
    }
}
