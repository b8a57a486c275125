//! Certificate PDF renderer

use async_trait::async_trait;
use certforge_core::models::RenderDetails;
use certforge_core::{CertificateError, CertificateResult, Config};
use printpdf::image_crate::codecs::jpeg::JpegDecoder;
use printpdf::image_crate::{ColorType, ImageDecoder};
use printpdf::{
    Color, ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject, Mm,
    PdfDocument, Pt, Px, Rgb,
};
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::layout::{
    layout_certificate, FontFace, RgbColor, Signatory, BACKGROUND_SCALE, PAGE_HEIGHT, PAGE_WIDTH,
};
use super::metrics::LoadedFont;

/// Writes a certificate document to a local path.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render `details` to `output_path`, replacing any file already there.
    /// `footer_url` is the verification link printed in the footer.
    async fn render(
        &self,
        details: &RenderDetails,
        footer_url: &str,
        output_path: &Path,
    ) -> CertificateResult<()>;
}

/// Read-only files the certificate design is drawn from.
#[derive(Debug, Clone)]
pub struct CertificateAssets {
    /// Background JPEG.
    pub template_path: PathBuf,
    pub heading_font_path: PathBuf,
    pub body_font_path: PathBuf,
}

impl CertificateAssets {
    /// Asset paths from configuration, relative ones resolved against the
    /// workspace root.
    pub fn from_config(config: &Config) -> Self {
        let root = config.workspace_root();
        CertificateAssets {
            template_path: root.join(config.template_path()),
            heading_font_path: root.join(config.heading_font_path()),
            body_font_path: root.join(config.body_font_path()),
        }
    }
}

/// Single-page A4 landscape certificate over a background template.
#[derive(Clone)]
pub struct PdfCertificateRenderer {
    inner: Arc<RendererInner>,
}

struct RendererInner {
    assets: CertificateAssets,
    signatory: Signatory,
}

impl PdfCertificateRenderer {
    pub fn new(assets: CertificateAssets, signatory: Signatory) -> Self {
        Self {
            inner: Arc::new(RendererInner { assets, signatory }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CertificateAssets::from_config(config),
            Signatory::new(config.signatory_name(), config.signatory_location()),
        )
    }
}

#[async_trait]
impl DocumentRenderer for PdfCertificateRenderer {
    async fn render(
        &self,
        details: &RenderDetails,
        footer_url: &str,
        output_path: &Path,
    ) -> CertificateResult<()> {
        let inner = Arc::clone(&self.inner);
        let details = details.clone();
        let footer_url = footer_url.to_string();
        let output = output_path.to_path_buf();
        let start = Instant::now();

        tokio::task::spawn_blocking(move || inner.render_blocking(&details, &footer_url, &output))
            .await
            .map_err(|e| CertificateError::Internal(format!("Render task failed: {}", e)))??;

        tracing::info!(
            path = %output_path.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Certificate document rendered"
        );
        Ok(())
    }
}

impl RendererInner {
    fn render_blocking(
        &self,
        details: &RenderDetails,
        footer_url: &str,
        output: &Path,
    ) -> CertificateResult<()> {
        remove_existing(output)?;

        let template_path = &self.assets.template_path;
        let template =
            fs::read(template_path).map_err(|e| CertificateError::asset(template_path, e))?;
        let heading = LoadedFont::read(&self.assets.heading_font_path)?;
        let body = LoadedFont::read(&self.assets.body_font_path)?;

        let background = jpeg_passthrough(template_path, template)?;
        let px_height = background.image.height.0;

        let (doc, page, layer) = PdfDocument::new(
            format!("Course Certificate - {}", details.course_name),
            Mm::from(Pt(PAGE_WIDTH)),
            Mm::from(Pt(PAGE_HEIGHT)),
            "Certificate",
        );
        let layer = doc.get_page(page).get_layer(layer);

        let heading_ref = doc
            .add_external_font(Cursor::new(heading.bytes()))
            .map_err(|e| {
                CertificateError::invalid_asset(&self.assets.heading_font_path, e.to_string())
            })?;
        let body_ref = doc.add_external_font(Cursor::new(body.bytes())).map_err(|e| {
            CertificateError::invalid_asset(&self.assets.body_font_path, e.to_string())
        })?;

        // Anchored at the top-left corner; at 72 dpi one pixel is one point
        // before scaling.
        background.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm::from(Pt(
                    PAGE_HEIGHT - px_height as f32 * BACKGROUND_SCALE,
                ))),
                scale_x: Some(BACKGROUND_SCALE),
                scale_y: Some(BACKGROUND_SCALE),
                dpi: Some(72.0),
                ..Default::default()
            },
        );

        let lines = layout_certificate(details, footer_url, &self.signatory, &heading, &body);
        for line in lines {
            let font = match line.face {
                FontFace::Heading => &heading_ref,
                FontFace::Body => &body_ref,
            };
            layer.set_fill_color(fill(line.color));
            layer.use_text(
                line.text,
                line.size,
                Mm::from(Pt(line.x)),
                Mm::from(Pt(line.baseline)),
                font,
            );
        }

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(output)?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| CertificateError::Render(e.to_string()))?;

        Ok(())
    }
}

/// Wrap the template JPEG as a DCT-encoded image so the PDF carries the
/// compressed bytes instead of decoded pixels.
fn jpeg_passthrough(path: &Path, jpeg: Vec<u8>) -> CertificateResult<Image> {
    let (width, height, color_type) = {
        let decoder = JpegDecoder::new(Cursor::new(jpeg.as_slice()))
            .map_err(|e| CertificateError::invalid_asset(path, e.to_string()))?;
        let (width, height) = decoder.dimensions();
        (width, height, decoder.color_type())
    };
    let color_space = match color_type {
        ColorType::L8 => ColorSpace::Greyscale,
        ColorType::Rgb8 => ColorSpace::Rgb,
        other => {
            return Err(CertificateError::invalid_asset(
                path,
                format!("unsupported JPEG colour type {:?}", other),
            ))
        }
    };

    Ok(Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: jpeg,
        image_filter: Some(ImageFilter::DCT),
        smask: None,
        clipping_bbox: None,
    }))
}

fn fill(color: RgbColor) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(color.r) / 255.0,
        f32::from(color.g) / 255.0,
        f32::from(color.b) / 255.0,
        None,
    ))
}

fn remove_existing(path: &Path) -> CertificateResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed previous document");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
