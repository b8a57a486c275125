//! Detail extraction
//!
//! Flattens a certificate record into `RenderDetails` and derives the base
//! filename every artifact of the certificate shares.

use certforge_core::models::{BaseFilename, CertificateSource, RenderDetails};
use certforge_core::{CertificateError, CertificateResult};

/// Builds rendering inputs from certificate records.
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    verify_base_url: String,
}

impl DetailExtractor {
    /// `verify_base_url` is prefixed verbatim to the record identifier.
    pub fn new(verify_base_url: impl Into<String>) -> Self {
        Self {
            verify_base_url: verify_base_url.into(),
        }
    }

    pub fn verify_base_url(&self) -> &str {
        &self.verify_base_url
    }

    /// Read every field generation needs. Fails on the first absent field.
    pub fn extract(
        &self,
        source: &dyn CertificateSource,
    ) -> CertificateResult<(RenderDetails, BaseFilename)> {
        let name = required(source.student_full_name(), "student.full_name")?;
        let email = required(source.student_email(), "student.email")?;
        let date = source
            .delivery_start_date()
            .ok_or(CertificateError::MissingField("delivery.start_date"))?;
        let course_name = required(source.course_title(), "delivery.course.title")?;
        // An empty description is a valid course; only an absent one is not.
        let course_desc = source
            .course_description()
            .ok_or(CertificateError::MissingField("delivery.course.description"))?;
        let identifier = required(source.identifier(), "identifier")?;

        let details = RenderDetails {
            name: name.to_string(),
            email: email.trim().to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            course_name: course_name.to_string(),
            course_desc: course_desc.to_string(),
            verify_url: format!("{}{}", self.verify_base_url, identifier.trim()),
        };
        let base = BaseFilename::from_details(&details);

        tracing::debug!(base = %base, verify_url = %details.verify_url, "Extracted certificate details");

        Ok((details, base))
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> CertificateResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(CertificateError::MissingField(field))
}
