//! Configuration module
//!
//! Process-wide settings for certificate generation: asset locations, output
//! layout, storage target, link shortening, mail delivery and preview
//! rendering. Built once at start-up and shared read-only afterwards.

use std::env;
use std::path::{Path, PathBuf};

use crate::storage_types::StorageBackend;

// Common constants
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_OUTPUT_DIR: &str = "pdf";
const DEFAULT_TEMPLATE_PATH: &str = "pdf/templates/crafta1.jpg";
const DEFAULT_HEADING_FONT: &str = "assets/fonts/Gotham-Bold.ttf";
const DEFAULT_BODY_FONT: &str = "assets/fonts/Gotham-Medium.ttf";
const DEFAULT_EMAIL_BODY: &str = "pdf/templates/body.txt";
const DEFAULT_SIGNATORY: &str = "Thomas Ochman";
const DEFAULT_LOCATION: &str = "Göteborg";
const DEFAULT_VERIFY_BASE_URL: &str = "http://localhost:9292/verify/";
const DEFAULT_BITLY_API_URL: &str = "https://api-ssl.bitly.com/v4";
const DEFAULT_SENDER_NAME: &str = "The course team";
const SMTP_PORT: u16 = 587;
const PREVIEW_DPI: f32 = 72.0;

/// Certificate generator configuration
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub environment: String,
    /// Local directory that storage keys are resolved against.
    pub workspace_root: PathBuf,
    /// Relative output directory; doubles as the storage key prefix.
    pub output_dir: String,
    // Side-channel assets
    pub template_path: PathBuf,
    pub heading_font_path: PathBuf,
    pub body_font_path: PathBuf,
    pub email_body_path: PathBuf,
    pub signatory_name: String,
    pub signatory_location: String,
    pub verify_base_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Link shortening
    pub bitly_access_token: Option<String>,
    pub bitly_group_guid: Option<String>,
    pub bitly_api_url: String,
    // Email notifications
    pub notifications_enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    pub mail_sender_name: String,
    // Preview rendering
    pub pdfium_library_path: Option<PathBuf>,
    pub preview_dpi: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            workspace_root: PathBuf::from("."),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            heading_font_path: PathBuf::from(DEFAULT_HEADING_FONT),
            body_font_path: PathBuf::from(DEFAULT_BODY_FONT),
            email_body_path: PathBuf::from(DEFAULT_EMAIL_BODY),
            signatory_name: DEFAULT_SIGNATORY.to_string(),
            signatory_location: DEFAULT_LOCATION.to_string(),
            verify_base_url: DEFAULT_VERIFY_BASE_URL.to_string(),
            storage_backend: StorageBackend::S3,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: None,
            local_storage_base_url: None,
            bitly_access_token: None,
            bitly_group_guid: None,
            bitly_api_url: DEFAULT_BITLY_API_URL.to_string(),
            notifications_enabled: true,
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            smtp_from: None,
            smtp_tls: true,
            mail_sender_name: DEFAULT_SENDER_NAME.to_string(),
            pdfium_library_path: None,
            preview_dpi: PREVIEW_DPI,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|s| s.trim().to_lowercase())
        .and_then(|s| match s.as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// `production` or `prod`, ignoring case and surrounding whitespace.
pub fn is_production_environment(environment: &str) -> bool {
    matches!(
        environment.trim().to_lowercase().as_str(),
        "production" | "prod"
    )
}

impl GeneratorConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GeneratorConfig::default();
        let environment = non_empty(lookup("ENVIRONMENT"))
            .map(|s| s.trim().to_lowercase())
            .unwrap_or(defaults.environment);
        let is_test = environment == "test";

        let storage_backend = match non_empty(lookup("STORAGE_BACKEND")) {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => defaults.storage_backend,
        };

        let preview_dpi = match non_empty(lookup("PREVIEW_DPI")) {
            Some(raw) => raw
                .trim()
                .parse::<f32>()
                .map_err(|e| anyhow::anyhow!("PREVIEW_DPI must be a number: {}", e))?,
            None => defaults.preview_dpi,
        };

        let smtp_port = match non_empty(lookup("SMTP_PORT")) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .ok()
                    .filter(|&p| p > 0)
                    .ok_or_else(|| {
                        anyhow::anyhow!("SMTP_PORT must be a port number (got {:?})", raw)
                    })?,
            ),
            None => None,
        };

        let config = GeneratorConfig {
            workspace_root: non_empty(lookup("CERTIFICATE_WORKSPACE"))
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
            output_dir: non_empty(lookup("CERTIFICATE_OUTPUT_DIR"))
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.output_dir),
            template_path: non_empty(lookup("CERTIFICATE_TEMPLATE_PATH"))
                .map(PathBuf::from)
                .unwrap_or(defaults.template_path),
            heading_font_path: non_empty(lookup("CERTIFICATE_HEADING_FONT"))
                .map(PathBuf::from)
                .unwrap_or(defaults.heading_font_path),
            body_font_path: non_empty(lookup("CERTIFICATE_BODY_FONT"))
                .map(PathBuf::from)
                .unwrap_or(defaults.body_font_path),
            email_body_path: non_empty(lookup("CERTIFICATE_EMAIL_BODY"))
                .map(PathBuf::from)
                .unwrap_or(defaults.email_body_path),
            signatory_name: non_empty(lookup("CERTIFICATE_SIGNATORY"))
                .unwrap_or(defaults.signatory_name),
            signatory_location: non_empty(lookup("CERTIFICATE_LOCATION"))
                .unwrap_or(defaults.signatory_location),
            verify_base_url: non_empty(lookup("SERVER_URL")).unwrap_or(defaults.verify_base_url),
            storage_backend,
            s3_bucket: non_empty(lookup("S3_BUCKET")),
            s3_region: non_empty(lookup("S3_REGION")),
            s3_endpoint: non_empty(lookup("S3_ENDPOINT")),
            aws_region: non_empty(lookup("AWS_REGION")),
            local_storage_path: non_empty(lookup("LOCAL_STORAGE_PATH")),
            local_storage_base_url: non_empty(lookup("LOCAL_STORAGE_BASE_URL")),
            bitly_access_token: non_empty(lookup("BITLY_ACCESS_TOKEN")),
            bitly_group_guid: non_empty(lookup("BITLY_GROUP_GUID")),
            bitly_api_url: non_empty(lookup("BITLY_API_URL"))
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.bitly_api_url),
            notifications_enabled: parse_bool(lookup("NOTIFICATIONS_ENABLED"), !is_test),
            smtp_host: non_empty(lookup("SMTP_HOST")),
            smtp_port,
            smtp_user: non_empty(lookup("SMTP_USER")),
            smtp_password: non_empty(lookup("SMTP_PASSWORD")),
            smtp_from: non_empty(lookup("SMTP_FROM")),
            smtp_tls: parse_bool(lookup("SMTP_TLS"), defaults.smtp_tls),
            mail_sender_name: non_empty(lookup("MAIL_SENDER_NAME"))
                .unwrap_or(defaults.mail_sender_name),
            pdfium_library_path: non_empty(lookup("PDFIUM_LIBRARY_PATH")).map(PathBuf::from),
            preview_dpi,
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.environment.is_empty()
            || !self
                .environment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(anyhow::anyhow!(
                "ENVIRONMENT must be a single path segment (got {:?})",
                self.environment
            ));
        }

        // Same segment rules as storage keys, which this directory prefixes.
        if self.output_dir.is_empty()
            || self.output_dir.starts_with('/')
            || self.output_dir.contains('\\')
            || self
                .output_dir
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(anyhow::anyhow!(
                "CERTIFICATE_OUTPUT_DIR must be a relative '/'-separated path without empty, '.' or '..' segments (got {:?})",
                self.output_dir
            ));
        }

        if !(self.preview_dpi > 0.0) {
            return Err(anyhow::anyhow!("PREVIEW_DPI must be greater than zero"));
        }

        if self.notifications_enabled && (self.smtp_host.is_none() || self.smtp_from.is_none()) {
            return Err(anyhow::anyhow!(
                "NOTIFICATIONS_ENABLED=true requires SMTP_HOST and SMTP_FROM to be set"
            ));
        }

        // Validate storage backend configuration
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<GeneratorConfig>);

impl Config {
    fn inner(&self) -> &GeneratorConfig {
        &self.0
    }

    pub fn new(config: GeneratorConfig) -> Self {
        Config(Box::new(config))
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = GeneratorConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_environment(self.environment())
    }

    /// Test-like execution context (`ENVIRONMENT=test`).
    pub fn is_test(&self) -> bool {
        self.environment() == "test"
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn workspace_root(&self) -> &Path {
        &self.inner().workspace_root
    }

    pub fn output_dir(&self) -> &str {
        &self.inner().output_dir
    }

    /// Environment-scoped key prefix, e.g. `pdf/production`.
    pub fn scoped_output_prefix(&self) -> String {
        format!("{}/{}", self.output_dir(), self.environment())
    }

    pub fn template_path(&self) -> &Path {
        &self.inner().template_path
    }

    pub fn heading_font_path(&self) -> &Path {
        &self.inner().heading_font_path
    }

    pub fn body_font_path(&self) -> &Path {
        &self.inner().body_font_path
    }

    pub fn email_body_path(&self) -> &Path {
        &self.inner().email_body_path
    }

    pub fn signatory_name(&self) -> &str {
        &self.inner().signatory_name
    }

    pub fn signatory_location(&self) -> &str {
        &self.inner().signatory_location
    }

    pub fn verify_base_url(&self) -> &str {
        &self.inner().verify_base_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn bitly_access_token(&self) -> Option<&str> {
        self.inner().bitly_access_token.as_deref()
    }

    pub fn bitly_group_guid(&self) -> Option<&str> {
        self.inner().bitly_group_guid.as_deref()
    }

    pub fn bitly_api_url(&self) -> &str {
        &self.inner().bitly_api_url
    }

    pub fn notifications_enabled(&self) -> bool {
        self.inner().notifications_enabled
    }

    pub fn smtp_host(&self) -> Option<&str> {
        self.inner().smtp_host.as_deref()
    }

    pub fn smtp_port(&self) -> u16 {
        self.inner().smtp_port.unwrap_or(SMTP_PORT)
    }

    pub fn smtp_user(&self) -> Option<&str> {
        self.inner().smtp_user.as_deref()
    }

    pub fn smtp_password(&self) -> Option<&str> {
        self.inner().smtp_password.as_deref()
    }

    pub fn smtp_from(&self) -> Option<&str> {
        self.inner().smtp_from.as_deref()
    }

    pub fn smtp_tls(&self) -> bool {
        self.inner().smtp_tls
    }

    pub fn mail_sender_name(&self) -> &str {
        &self.inner().mail_sender_name
    }

    pub fn pdfium_library_path(&self) -> Option<&Path> {
        self.inner().pdfium_library_path.as_deref()
    }

    pub fn preview_dpi(&self) -> f32 {
        self.inner().preview_dpi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn local_test_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ENVIRONMENT", "test"),
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/certforge-test"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:3000/files"),
        ]
    }

    #[test]
    fn test_environment_disables_notifications_by_default() {
        let config = GeneratorConfig::from_lookup(lookup_from(&local_test_env())).unwrap();
        assert_eq!(config.environment, "test");
        assert!(!config.notifications_enabled);
        assert_eq!(config.verify_base_url, DEFAULT_VERIFY_BASE_URL);
    }

    #[test]
    fn notifications_require_smtp_settings() {
        let mut env = local_test_env();
        env.push(("NOTIFICATIONS_ENABLED", "true"));
        let err = GeneratorConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err.to_string().contains("SMTP_HOST"));

        env.push(("SMTP_HOST", "smtp.example.com"));
        env.push(("SMTP_FROM", "courses@example.com"));
        let config = GeneratorConfig::from_lookup(lookup_from(&env)).unwrap();
        assert!(config.notifications_enabled);
    }

    #[test]
    fn s3_backend_requires_bucket_and_region() {
        let env = [("ENVIRONMENT", "test")];
        let err = GeneratorConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));

        let env = [("ENVIRONMENT", "test"), ("S3_BUCKET", "certs")];
        let err = GeneratorConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err.to_string().contains("AWS_REGION"));

        let env = [
            ("ENVIRONMENT", "test"),
            ("S3_BUCKET", "certs"),
            ("AWS_REGION", "eu-north-1"),
        ];
        assert!(GeneratorConfig::from_lookup(lookup_from(&env)).is_ok());
    }

    #[test]
    fn output_dir_must_stay_relative() {
        let mut env = local_test_env();
        env.push(("CERTIFICATE_OUTPUT_DIR", "/var/certs"));
        assert!(GeneratorConfig::from_lookup(lookup_from(&env)).is_err());

        let mut env = local_test_env();
        env.push(("CERTIFICATE_OUTPUT_DIR", "out/../../etc"));
        assert!(GeneratorConfig::from_lookup(lookup_from(&env)).is_err());
    }

    #[test]
    fn output_dir_rejects_segments_storage_keys_reject() {
        for dir in ["./pdf", "pdf//x", "pdf/./x", "pdf\\x"] {
            let mut env = local_test_env();
            env.push(("CERTIFICATE_OUTPUT_DIR", dir));
            let err = GeneratorConfig::from_lookup(lookup_from(&env)).unwrap_err();
            assert!(
                err.to_string().contains("CERTIFICATE_OUTPUT_DIR"),
                "{dir:?} should be rejected"
            );
        }

        let mut env = local_test_env();
        env.push(("CERTIFICATE_OUTPUT_DIR", "out/certs/"));
        let config = GeneratorConfig::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.output_dir, "out/certs");
    }

    #[test]
    fn malformed_smtp_port_is_rejected() {
        for port in ["smtp", "0", "70000"] {
            let mut env = local_test_env();
            env.push(("SMTP_PORT", port));
            let err = GeneratorConfig::from_lookup(lookup_from(&env)).unwrap_err();
            assert!(err.to_string().contains("SMTP_PORT"), "{port:?} should be rejected");
        }

        let mut env = local_test_env();
        env.push(("SMTP_PORT", "2525"));
        let config = Config::new(GeneratorConfig::from_lookup(lookup_from(&env)).unwrap());
        assert_eq!(config.smtp_port(), 2525);

        let config = Config::new(GeneratorConfig::from_lookup(lookup_from(&local_test_env())).unwrap());
        assert_eq!(config.smtp_port(), 587);
    }

    #[test]
    fn scoped_prefix_joins_output_dir_and_environment() {
        let mut env = local_test_env();
        env.push(("CERTIFICATE_OUTPUT_DIR", "certificates/"));
        let config = Config::new(GeneratorConfig::from_lookup(lookup_from(&env)).unwrap());
        assert_eq!(config.scoped_output_prefix(), "certificates/test");
        assert!(config.is_test());
        assert!(!config.is_production());
    }

    #[test]
    fn production_environment_names() {
        assert!(is_production_environment("production"));
        assert!(is_production_environment(" Prod "));
        assert!(!is_production_environment("test"));
        assert!(!is_production_environment("preproduction"));

        let mut env = local_test_env();
        env[0] = ("ENVIRONMENT", "PRODUCTION");
        let config = Config::new(GeneratorConfig::from_lookup(lookup_from(&env)).unwrap());
        assert!(config.is_production());
    }

    #[test]
    fn invalid_preview_dpi_is_rejected() {
        let mut env = local_test_env();
        env.push(("PREVIEW_DPI", "0"));
        assert!(GeneratorConfig::from_lookup(lookup_from(&env)).is_err());

        let mut env = local_test_env();
        env.push(("PREVIEW_DPI", "high"));
        assert!(GeneratorConfig::from_lookup(lookup_from(&env)).is_err());
    }
}
