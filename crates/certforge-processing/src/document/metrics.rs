//! TrueType metrics for layout, read with ab_glyph.

use ab_glyph::{Font, FontVec};
use certforge_core::{CertificateError, CertificateResult};
use std::path::Path;

use super::layout::FontMetrics;

/// A loaded font file: raw bytes for embedding plus parsed metrics.
pub struct LoadedFont {
    bytes: Vec<u8>,
    font: FontVec,
    units_per_em: f32,
}

impl LoadedFont {
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> CertificateResult<Self> {
        let font = FontVec::try_from_vec(bytes.clone())
            .map_err(|e| CertificateError::invalid_asset(path, format!("not a usable font: {}", e)))?;
        let units_per_em = font
            .units_per_em()
            .ok_or_else(|| CertificateError::invalid_asset(path, "font has no units per em"))?;

        Ok(LoadedFont {
            bytes,
            font,
            units_per_em,
        })
    }

    pub fn read(path: &Path) -> CertificateResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| CertificateError::asset(path, e))?;
        Self::from_bytes(path, bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn scale(&self, size: f32) -> f32 {
        size / self.units_per_em
    }
}

impl FontMetrics for LoadedFont {
    fn ascent(&self, size: f32) -> f32 {
        self.font.ascent_unscaled() * self.scale(size)
    }

    fn descent(&self, size: f32) -> f32 {
        self.font.descent_unscaled() * self.scale(size)
    }

    fn line_gap(&self, size: f32) -> f32 {
        self.font.line_gap_unscaled() * self.scale(size)
    }

    fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: f32 = text
            .chars()
            .map(|c| self.font.h_advance_unscaled(self.font.glyph_id(c)))
            .sum();
        units * self.scale(size)
    }
}

/// Fonts commonly installed on developer machines and CI images.
#[cfg(test)]
pub(crate) fn find_system_font() -> Option<std::path::PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .iter()
    .map(std::path::PathBuf::from)
    .find(|p| p.exists())
}
