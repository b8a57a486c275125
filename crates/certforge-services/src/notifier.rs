//! Email delivery of finished certificates via lettre.

use async_trait::async_trait;
use certforge_core::models::{ArtifactPaths, RenderDetails};
use certforge_core::{CertificateError, CertificateResult, Config, NotificationStatus, Notifier};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::{Path, PathBuf};

/// Sender identity and the body template of certificate mails.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub sender_name: String,
    pub from_address: String,
    pub body_template_path: PathBuf,
}

/// Emails the recipient with the rendered document attached.
pub struct EmailNotifier<T> {
    transport: T,
    settings: MailSettings,
}

impl<T> EmailNotifier<T> {
    pub fn new(transport: T, settings: MailSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl EmailNotifier<AsyncSmtpTransport<Tokio1Executor>> {
    /// SMTP notifier from configuration. STARTTLS unless `SMTP_TLS=false`.
    pub fn smtp_from_config(config: &Config) -> CertificateResult<Self> {
        let host = config
            .smtp_host()
            .ok_or_else(|| CertificateError::Notification("SMTP_HOST not configured".into()))?;
        let from = config
            .smtp_from()
            .ok_or_else(|| CertificateError::Notification("SMTP_FROM not configured".into()))?;
        let port = config.smtp_port();
        let credentials = match (config.smtp_user(), config.smtp_password()) {
            (Some(u), Some(p)) => Some(Credentials::new(u.to_string(), p.to_string())),
            _ => None,
        };

        let builder = if config.smtp_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| CertificateError::Notification(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(port);
        let builder = match credentials {
            Some(c) => builder.credentials(c),
            None => builder,
        };

        tracing::info!(
            host = %host,
            port = port,
            tls = config.smtp_tls(),
            "Email notifier initialized"
        );

        Ok(Self::new(
            builder.build(),
            MailSettings {
                sender_name: config.mail_sender_name().to_string(),
                from_address: from.to_string(),
                body_template_path: config.workspace_root().join(config.email_body_path()),
            },
        ))
    }
}

impl<T> EmailNotifier<T>
where
    T: AsyncTransport + Send + Sync,
{
    async fn compose(
        &self,
        details: &RenderDetails,
        paths: &ArtifactPaths,
    ) -> CertificateResult<Message> {
        let from = mailbox(&self.settings.sender_name, &self.settings.from_address)?;
        let to = mailbox(&details.name, &details.email)?;

        let body = read_template(&self.settings.body_template_path).await?;
        let document = tokio::fs::read(&paths.certificate_path).await?;
        let pdf = ContentType::parse("application/pdf")
            .map_err(|e| CertificateError::Internal(e.to_string()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(format!("Course Certificate - {}", details.course_name))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(Attachment::new(paths.attachment_name()).body(document, pdf)),
            )
            .map_err(|e| CertificateError::Notification(e.to_string()))
    }
}

#[async_trait]
impl<T> Notifier for EmailNotifier<T>
where
    T: AsyncTransport + Send + Sync,
    T::Error: std::fmt::Display,
{
    async fn notify(
        &self,
        details: &RenderDetails,
        paths: &ArtifactPaths,
    ) -> CertificateResult<NotificationStatus> {
        let message = self.compose(details, paths).await?;

        self.transport.send(message).await.map_err(|e| {
            tracing::error!(error = %e, recipient = %details.email, "Certificate email failed");
            CertificateError::Notification(e.to_string())
        })?;

        tracing::info!(
            recipient = %details.email,
            attachment = %paths.attachment_name(),
            "Certificate email sent"
        );
        Ok(NotificationStatus::Sent)
    }
}

fn mailbox(name: &str, email: &str) -> CertificateResult<Mailbox> {
    let address: Address = email.trim().parse().map_err(|e| {
        CertificateError::Notification(format!("Invalid email address {:?}: {}", email, e))
    })?;
    Ok(Mailbox::new(Some(name.to_string()), address))
}

async fn read_template(path: &Path) -> CertificateResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CertificateError::asset(path, e))
}
