//! First-page JPEG preview of a rendered document, rasterized with pdfium.

use async_trait::async_trait;
use certforge_core::{CertificateError, CertificateResult, Config};
use pdfium_render::prelude::*;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Converts a rendered document into a raster preview.
#[async_trait]
pub trait PreviewDeriver: Send + Sync {
    /// Write page one of `document_path` to `image_path` as a JPEG.
    async fn derive(&self, document_path: &Path, image_path: &Path) -> CertificateResult<()>;
}

/// Preview deriver backed by a runtime-bound pdfium library.
#[derive(Debug, Clone)]
pub struct PdfiumPreviewDeriver {
    library_path: Option<PathBuf>,
    dpi: f32,
}

impl PdfiumPreviewDeriver {
    /// `library_path` is the directory holding the pdfium shared library;
    /// `None` binds the system library.
    pub fn new(library_path: Option<PathBuf>, dpi: f32) -> Self {
        Self { library_path, dpi }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.pdfium_library_path().map(Path::to_path_buf),
            config.preview_dpi(),
        )
    }

    fn bind(&self) -> CertificateResult<Pdfium> {
        let bindings = match &self.library_path {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| {
            CertificateError::ImageDerivation(format!("pdfium library unavailable: {}", e))
        })?;
        Ok(Pdfium::new(bindings))
    }

    fn derive_blocking(&self, document_path: &Path, image_path: &Path) -> CertificateResult<()> {
        check_pdf_header(document_path)?;

        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(document_path, None)
            .map_err(|e| malformed(document_path, e))?;
        let page = document
            .pages()
            .first()
            .map_err(|e| malformed(document_path, e))?;

        let config = PdfRenderConfig::new().scale_page_by_factor(self.dpi / 72.0);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| CertificateError::ImageDerivation(e.to_string()))?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba = ::image::RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
            .ok_or_else(|| {
                CertificateError::ImageDerivation("bitmap size does not match its dimensions".into())
            })?;

        if let Some(parent) = image_path.parent() {
            fs::create_dir_all(parent)?;
        }
        // JPEG has no alpha channel
        ::image::DynamicImage::ImageRgba8(rgba)
            .to_rgb8()
            .save_with_format(image_path, ::image::ImageFormat::Jpeg)
            .map_err(|e| CertificateError::ImageDerivation(e.to_string()))?;

        tracing::debug!(width, height, dpi = self.dpi, "Rasterized first page");
        Ok(())
    }
}

#[async_trait]
impl PreviewDeriver for PdfiumPreviewDeriver {
    async fn derive(&self, document_path: &Path, image_path: &Path) -> CertificateResult<()> {
        let deriver = self.clone();
        let document = document_path.to_path_buf();
        let image = image_path.to_path_buf();
        let start = Instant::now();

        tokio::task::spawn_blocking(move || deriver.derive_blocking(&document, &image))
            .await
            .map_err(|e| CertificateError::Internal(format!("Preview task failed: {}", e)))??;

        tracing::info!(
            document = %document_path.display(),
            image = %image_path.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Preview image derived"
        );
        Ok(())
    }
}

fn malformed(path: &Path, err: PdfiumError) -> CertificateError {
    CertificateError::ImageDerivation(format!(
        "malformed document {}: {}",
        path.display(),
        err
    ))
}

/// Fail fast on files that are not PDFs at all.
fn check_pdf_header(path: &Path) -> CertificateResult<()> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            CertificateError::ImageDerivation(format!("document {} not found", path.display()))
        } else {
            CertificateError::Io(e)
        }
    })?;

    let mut header = [0u8; 5];
    let mut read = 0;
    while read < header.len() {
        match file.read(&mut header[read..])? {
            0 => break,
            n => read += n,
        }
    }

    if &header[..read] != PDF_MAGIC {
        return Err(CertificateError::ImageDerivation(format!(
            "malformed document {}: missing %PDF- header",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_garbage_document_fails_before_binding() {
        let dir = tempdir().unwrap();
        let document = dir.path().join("broken.pdf");
        fs::write(&document, b"<html>definitely not a pdf</html>").unwrap();

        let deriver = PdfiumPreviewDeriver::new(Some(dir.path().join("no-lib")), 72.0);
        let err = deriver
            .derive(&document, &dir.path().join("broken.jpg"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("missing %PDF- header"), "{err}");
        assert!(!dir.path().join("broken.jpg").exists());
    }

    #[tokio::test]
    async fn test_empty_and_missing_documents_fail() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.pdf");
        fs::write(&empty, b"").unwrap();
        let deriver = PdfiumPreviewDeriver::new(None, 72.0);

        let err = deriver
            .derive(&empty, &dir.path().join("empty.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, CertificateError::ImageDerivation(_)));

        let err = deriver
            .derive(&dir.path().join("absent.pdf"), &dir.path().join("absent.jpg"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_header_check_accepts_pdf_magic() {
        let dir = tempdir().unwrap();
        let document = dir.path().join("ok.pdf");
        fs::write(&document, b"%PDF-1.3\n%...").unwrap();
        assert!(check_pdf_header(&document).is_ok());
    }

    /// Renders a real certificate and rasterizes it at `dpi`. `None` when
    /// no system font or pdfium library is available.
    #[cfg(feature = "document")]
    async fn rasterize_certificate(dir: &Path, dpi: f32) -> Option<::image::DynamicImage> {
        use crate::document::metrics::find_system_font;
        use crate::document::{CertificateAssets, DocumentRenderer, PdfCertificateRenderer, Signatory};
        use certforge_core::models::RenderDetails;

        let font = find_system_font()?;
        let deriver = PdfiumPreviewDeriver::new(
            std::env::var_os("PDFIUM_LIBRARY_PATH").map(PathBuf::from),
            dpi,
        );
        if deriver.bind().is_err() {
            return None;
        }

        let template = dir.join("template.jpg");
        ::image::RgbImage::from_pixel(200, 141, ::image::Rgb([240, 240, 240]))
            .save(&template)
            .unwrap();
        let renderer = PdfCertificateRenderer::new(
            CertificateAssets {
                template_path: template,
                heading_font_path: font.clone(),
                body_font_path: font,
            },
            Signatory::new("Thomas Ochman", "Göteborg"),
        );
        let details = RenderDetails {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            date: "2024-01-10".to_string(),
            course_name: "Systems Design".to_string(),
            course_desc: "Intro".to_string(),
            verify_url: "http://host/verify/abc123".to_string(),
        };

        let document = dir.join(format!("ada-{dpi}.pdf"));
        let preview = dir.join(format!("ada-{dpi}.jpg"));
        renderer
            .render(&details, "http://bit.ly/abc", &document)
            .await
            .unwrap();
        deriver.derive(&document, &preview).await.unwrap();

        let bytes = fs::read(&preview).unwrap();
        assert!(bytes.starts_with(&[0xFF, 0xD8]), "preview is not a JPEG");
        Some(::image::load_from_memory(&bytes).unwrap())
    }

    #[cfg(feature = "document")]
    fn assert_page_pixels(image: &::image::DynamicImage, dpi: f32) {
        use crate::document::layout::{PAGE_HEIGHT, PAGE_WIDTH};

        let scale = dpi / 72.0;
        let expected_w = (PAGE_WIDTH * scale).round() as i64;
        let expected_h = (PAGE_HEIGHT * scale).round() as i64;
        assert!(
            (i64::from(image.width()) - expected_w).abs() <= 1
                && (i64::from(image.height()) - expected_h).abs() <= 1,
            "{}x{} at {dpi} dpi, expected {expected_w}x{expected_h}",
            image.width(),
            image.height()
        );
    }

    #[cfg(feature = "document")]
    #[tokio::test]
    async fn test_first_page_rasterized_at_configured_dpi() {
        let dir = tempdir().unwrap();

        let Some(preview) = rasterize_certificate(dir.path(), 72.0).await else {
            return;
        };
        assert_page_pixels(&preview, 72.0);
        assert_eq!((preview.width(), preview.height()), (842, 595));
        assert_eq!(preview.color(), ::image::ColorType::Rgb8);

        let Some(hires) = rasterize_certificate(dir.path(), 144.0).await else {
            return;
        };
        assert_page_pixels(&hires, 144.0);
    }
}
