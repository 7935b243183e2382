//! Configuration types for the conversion service.
//!
//! All service behaviour is controlled through [`ServiceConfig`], built via
//! its [`ServiceConfigBuilder`]. Directories are explicit fields rather than
//! process-wide globals, so every operation receives the paths it works in
//! and tests can point a service at a throwaway directory.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder encoded when a QR request carries no payload.
pub const DEFAULT_QR_PAYLOAD: &str = "https://google.com";

/// Largest QR image side, in pixels, a style may produce (at version 40).
pub const MAX_QR_IMAGE_SIDE: u32 = 8192;

/// Largest `badge_padding` accepted, in pixels.
pub const MAX_BADGE_PADDING: u32 = 1000;

// Modules per side of a version-40 symbol.
const MAX_SYMBOL_MODULES: u64 = 177;

/// Configuration for the conversion service.
///
/// # Example
/// ```rust
/// use quickconvert::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .upload_dir("/tmp/qc/uploads")
///     .output_dir("/tmp/qc/outputs")
///     .max_rendered_pixels(1600)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_rendered_pixels, 1600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Where uploads are staged while a request is processed. Default: `./uploads`.
    ///
    /// Each request gets its own temporary sub-directory that is removed when
    /// the request finishes, whatever the outcome.
    pub upload_dir: PathBuf,

    /// Where converted artifacts are written. Default: `./outputs`.
    pub output_dir: PathBuf,

    /// Logo embedded in QR codes when the request does not upload one.
    /// Default: `None` (plain QR codes).
    pub default_logo: Option<PathBuf>,

    /// Office-suite executable used for Word/PPT/Excel → PDF. Default: `libreoffice`.
    pub office_binary: String,

    /// Seconds to wait for the office suite before killing it. Default: 120.
    pub office_timeout_secs: u64,

    /// Directory containing the pdfium shared library. Default: `None`,
    /// meaning the working directory and then the system library path.
    pub pdfium_library_path: Option<PathBuf>,

    /// Longest edge of the image produced by PDF → Image. Default: 2000.
    pub max_rendered_pixels: u32,

    /// JPEG quality for PDF → Image (1–100). Default: 90.
    pub jpeg_quality: u8,

    /// Maximum accepted request body, in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Keep artifacts in `output_dir` after they have been sent. Default: false.
    pub retain_outputs: bool,

    /// Page layout for Text → PDF.
    pub text_layout: TextLayout,

    /// Geometry of generated QR codes.
    pub qr: QrStyle,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            default_logo: None,
            office_binary: "libreoffice".to_string(),
            office_timeout_secs: 120,
            pdfium_library_path: None,
            max_rendered_pixels: 2000,
            jpeg_quality: 90,
            max_upload_bytes: 50 * 1024 * 1024,
            retain_outputs: false,
            text_layout: TextLayout::default(),
            qr: QrStyle::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Create `upload_dir` and `output_dir` if they do not exist yet.
    pub fn ensure_dirs(&self) -> Result<(), ConvertError> {
        for dir in [&self.upload_dir, &self.output_dir] {
            std::fs::create_dir_all(dir).map_err(|e| ConvertError::OutputWriteFailed {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn upload_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.upload_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn default_logo(mut self, path: impl AsRef<Path>) -> Self {
        self.config.default_logo = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn office_binary(mut self, bin: impl Into<String>) -> Self {
        self.config.office_binary = bin.into();
        self
    }

    pub fn office_timeout_secs(mut self, secs: u64) -> Self {
        self.config.office_timeout_secs = secs.max(1);
        self
    }

    pub fn pdfium_library_path(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.pdfium_library_path = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn retain_outputs(mut self, v: bool) -> Self {
        self.config.retain_outputs = v;
        self
    }

    pub fn text_layout(mut self, layout: TextLayout) -> Self {
        self.config.text_layout = layout;
        self
    }

    pub fn qr_style(mut self, style: QrStyle) -> Self {
        self.config.qr = style;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ConvertError> {
        let c = &self.config;
        if c.upload_dir.as_os_str().is_empty() || c.output_dir.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "upload and output directories must be set".into(),
            ));
        }
        if c.office_binary.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "office binary must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(ConvertError::InvalidConfig(
                "max upload size must be ≥ 1 byte".into(),
            ));
        }
        c.qr.validate()?;
        c.text_layout.validate()?;
        Ok(self.config)
    }
}

// ── Nested settings ──────────────────────────────────────────────────────

/// Geometry and fallback behaviour of generated QR codes.
///
/// | Field | Default | Meaning |
/// |-------|---------|---------|
/// | `min_version` | 4 | smallest symbol version tried before growing |
/// | `module_size` | 10 | pixels per module |
/// | `border` | 4 | quiet-zone width in modules |
/// | `logo_ratio` | 3 | logo may take at most `width / logo_ratio` pixels |
/// | `badge_padding` | 10 | white margin around the logo, per side |
/// | `corner_radius` | 15 | badge corner radius in pixels |
/// | `max_badge_coverage` | 30 | badge may span this percentage of the symbol side |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrStyle {
    pub min_version: i16,
    pub module_size: u32,
    pub border: u32,
    pub logo_ratio: u32,
    pub badge_padding: u32,
    pub corner_radius: u32,
    pub max_badge_coverage: u32,
    /// Encoded instead of an empty payload.
    pub fallback_payload: String,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            min_version: 4,
            module_size: 10,
            border: 4,
            logo_ratio: 3,
            badge_padding: 10,
            corner_radius: 15,
            max_badge_coverage: 30,
            fallback_payload: DEFAULT_QR_PAYLOAD.to_string(),
        }
    }
}

impl QrStyle {
    /// Check the style against the limits `ServiceConfigBuilder::build` enforces.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !(1..=40).contains(&self.min_version) {
            return Err(ConvertError::InvalidConfig(format!(
                "QR min version must be 1–40, got {}",
                self.min_version
            )));
        }
        if self.module_size == 0 {
            return Err(ConvertError::InvalidConfig(
                "QR module size must be ≥ 1".into(),
            ));
        }
        let widest = (MAX_SYMBOL_MODULES + 2 * u64::from(self.border))
            .saturating_mul(u64::from(self.module_size));
        if widest > u64::from(MAX_QR_IMAGE_SIDE) {
            return Err(ConvertError::InvalidConfig(format!(
                "QR module size {} with border {} gives a {widest} px image at version 40 \
(max {MAX_QR_IMAGE_SIDE})",
                self.module_size, self.border
            )));
        }
        if self.badge_padding > MAX_BADGE_PADDING {
            return Err(ConvertError::InvalidConfig(format!(
                "QR badge padding must be ≤ {MAX_BADGE_PADDING}, got {}",
                self.badge_padding
            )));
        }
        if self.logo_ratio < 2 {
            return Err(ConvertError::InvalidConfig(format!(
                "QR logo ratio must be ≥ 2, got {}",
                self.logo_ratio
            )));
        }
        if !(1..=100).contains(&self.max_badge_coverage) {
            return Err(ConvertError::InvalidConfig(format!(
                "QR badge coverage must be 1–100 %, got {}",
                self.max_badge_coverage
            )));
        }
        if self.fallback_payload.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "QR fallback payload must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Page layout for Text → PDF, in PDF points (1/72 inch).
///
/// Defaults reproduce a US-Letter page with Helvetica 12 pt starting at
/// (40, 750) and a 15 pt line step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub left_margin: f32,
    pub top: f32,
    pub bottom_margin: f32,
    pub line_height: f32,
    pub font_size: f32,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            left_margin: 40.0,
            top: 750.0,
            bottom_margin: 40.0,
            line_height: 15.0,
            font_size: 12.0,
        }
    }
}

impl TextLayout {
    /// Number of lines that fit on one page.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.top - self.bottom_margin;
        ((usable / self.line_height).floor() as usize) + 1
    }

    fn validate(&self) -> Result<(), ConvertError> {
        if self.line_height <= 0.0 || self.font_size <= 0.0 {
            return Err(ConvertError::InvalidConfig(
                "line height and font size must be positive".into(),
            ));
        }
        if self.top <= self.bottom_margin || self.top > self.page_height {
            return Err(ConvertError::InvalidConfig(format!(
                "text top {} must lie between bottom margin {} and page height {}",
                self.top, self.bottom_margin, self.page_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let c = ServiceConfig::builder().build().unwrap();
        assert_eq!(c.qr.min_version, 4);
        assert_eq!(c.qr.fallback_payload, DEFAULT_QR_PAYLOAD);
        assert_eq!(c.office_binary, "libreoffice");
        assert!(!c.retain_outputs);
    }

    #[test]
    fn setters_clamp() {
        let c = ServiceConfig::builder()
            .jpeg_quality(0)
            .max_rendered_pixels(10)
            .office_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.jpeg_quality, 1);
        assert_eq!(c.max_rendered_pixels, 100);
        assert_eq!(c.office_timeout_secs, 1);
    }

    #[test]
    fn invalid_qr_style_rejected() {
        let style = QrStyle {
            min_version: 41,
            ..QrStyle::default()
        };
        let err = ServiceConfig::builder().qr_style(style).build().unwrap_err();
        assert!(err.to_string().contains("1–40"), "got: {err}");
    }

    #[test]
    fn oversized_qr_geometry_rejected() {
        let huge_modules = QrStyle {
            module_size: u32::MAX,
            ..QrStyle::default()
        };
        let err = ServiceConfig::builder()
            .qr_style(huge_modules)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("version 40"), "got: {err}");

        let huge_border = QrStyle {
            border: u32::MAX,
            ..QrStyle::default()
        };
        assert!(ServiceConfig::builder().qr_style(huge_border).build().is_err());

        let huge_padding = QrStyle {
            badge_padding: u32::MAX,
            ..QrStyle::default()
        };
        let err = ServiceConfig::builder()
            .qr_style(huge_padding)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("badge padding"), "got: {err}");
    }

    #[test]
    fn largest_allowed_qr_geometry_builds() {
        // (177 + 2 * 4) * 44 = 8140 px
        let style = QrStyle {
            module_size: 44,
            badge_padding: MAX_BADGE_PADDING,
            ..QrStyle::default()
        };
        assert!(ServiceConfig::builder().qr_style(style).build().is_ok());
    }

    #[test]
    fn empty_office_binary_rejected() {
        assert!(ServiceConfig::builder().office_binary("  ").build().is_err());
    }

    #[test]
    fn letter_layout_fits_48_lines() {
        // 750 → 45 in 15 pt steps
        assert_eq!(TextLayout::default().lines_per_page(), 48);
    }

    #[test]
    fn ensure_dirs_creates_both() {
        let tmp = tempfile::tempdir().unwrap();
        let c = ServiceConfig::builder()
            .upload_dir(tmp.path().join("a/up"))
            .output_dir(tmp.path().join("b/out"))
            .build()
            .unwrap();
        c.ensure_dirs().unwrap();
        assert!(c.upload_dir.is_dir());
        assert!(c.output_dir.is_dir());
    }
}
