//! QR badge compositor: QR symbols with a logo embedded in the centre.
//!
//! ```text
//! payload ──▶ encode (EC High, fit from min version)
//!         ──▶ render (RGBA, black on white, fixed module size + border)
//!         ──▶ badge  (capped logo on a white rounded rectangle)   [optional]
//!         ──▶ overlay badge at the centre
//!         ──▶ PNG
//! ```
//!
//! Error correction level High tolerates roughly 30% of the symbol being
//! obscured, which is what lets the badge cover the centre while the code
//! still scans. That budget is counted in codewords, not area: a square
//! badge clips many 8-module codewords along its edges, so a badge spanning
//! half the symbol side already exceeds the correction capacity of a
//! version 4 block. The logo is therefore capped twice, at
//! `width / logo_ratio` and so that the whole badge spans at most
//! `max_badge_coverage` percent of the symbol side. The badge is pasted
//! over the symbol, so image dimensions are identical with and without a
//! logo.
//!
//! Logo problems are never fatal: an unreadable or undecodable logo is
//! logged and reported as [`LogoOutcome::Failed`], and the plain symbol is
//! written instead. Only encoding and output failures surface as
//! [`ConvertError`].

use crate::config::QrStyle;
use crate::error::{ConvertError, LogoError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use qrcode::bits::Bits;
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode, Version};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAX_VERSION: i16 = 40;
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Where the badge landed on the QR image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgePlacement {
    /// Top-left corner of the badge.
    pub x: i64,
    pub y: i64,
    /// Badge size (logo + padding on both sides).
    pub width: u32,
    pub height: u32,
    /// Size of the logo after downscaling.
    pub logo_width: u32,
    pub logo_height: u32,
}

impl BadgePlacement {
    /// Top-left corner of the logo itself.
    pub fn logo_origin(&self) -> (i64, i64) {
        (
            self.x + ((self.width - self.logo_width) / 2) as i64,
            self.y + ((self.height - self.logo_height) / 2) as i64,
        )
    }
}

/// What happened to the optional logo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogoOutcome {
    /// No logo was requested.
    None,
    /// A logo path was given but nothing exists there.
    Skipped { path: PathBuf },
    /// The logo was composited.
    Embedded(BadgePlacement),
    /// The logo could not be used; the plain symbol was written.
    Failed(LogoError),
}

/// Report of a generated QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrOutcome {
    /// The text actually encoded (the fallback when the request was empty).
    pub payload: String,
    /// Symbol version chosen by the fit search.
    pub version: i16,
    /// Modules per side, without the quiet zone.
    pub modules: usize,
    /// Image size in pixels.
    pub width: u32,
    pub height: u32,
    pub logo: LogoOutcome,
}

/// Generate a QR code for `payload`, badge `logo_path` into it, and write a PNG.
///
/// # Errors
/// * [`ConvertError::PayloadTooLong`]: the payload does not fit version 40.
/// * [`ConvertError::InvalidConfig`]: `style` fails [`QrStyle::validate`].
/// * [`ConvertError::OutputWriteFailed`]: `output_path` cannot be written
///   (its parent directory must already exist).
///
/// A missing, unreadable or corrupt logo is not an error; see
/// [`QrOutcome::logo`].
pub fn generate(
    payload: &str,
    logo_path: Option<&Path>,
    output_path: &Path,
    style: &QrStyle,
) -> Result<QrOutcome, ConvertError> {
    let (image, outcome) = compose(payload, logo_path, style)?;
    save_png(&image, output_path)?;
    info!(
        "QR code written: {} ({}x{}, version {})",
        output_path.display(),
        outcome.width,
        outcome.height,
        outcome.version
    );
    Ok(outcome)
}

/// Build the QR image in memory without writing it.
pub fn compose(
    payload: &str,
    logo_path: Option<&Path>,
    style: &QrStyle,
) -> Result<(RgbaImage, QrOutcome), ConvertError> {
    style.validate()?;
    let data = effective_payload(payload, style);
    if payload.is_empty() {
        info!("Empty QR payload, encoding fallback '{}'", data);
    }

    let code = encode_symbol(data, style.min_version)?;
    let mut image = render_symbol(&code, style.module_size, style.border);

    let logo = match logo_path {
        None => LogoOutcome::None,
        Some(path) if !path.exists() => {
            debug!("Logo '{}' does not exist, skipping badge", path.display());
            LogoOutcome::Skipped {
                path: path.to_path_buf(),
            }
        }
        Some(path) => match embed_logo(&mut image, path, style) {
            Ok(placement) => LogoOutcome::Embedded(placement),
            Err(e) => {
                warn!("QR logo processing error: {}", e);
                LogoOutcome::Failed(e)
            }
        },
    };

    let outcome = QrOutcome {
        payload: data.to_string(),
        version: version_number(code.version()),
        modules: code.width(),
        width: image.width(),
        height: image.height(),
        logo,
    };
    Ok((image, outcome))
}

/// The text to encode: `payload`, or the configured fallback when it is empty.
pub fn effective_payload<'a>(payload: &'a str, style: &'a QrStyle) -> &'a str {
    if payload.is_empty() {
        &style.fallback_payload
    } else {
        payload
    }
}

/// Encode at EC level High, trying versions from `min_version` up to 40.
///
/// The payload always goes in as one byte-mode segment of UTF-8. Letting
/// the encoder pick Kanji mode would turn UTF-8 byte pairs that happen to
/// be valid Shift JIS into different characters on a scanner.
pub fn encode_symbol(payload: &str, min_version: i16) -> Result<QrCode, ConvertError> {
    for v in min_version.max(1)..=MAX_VERSION {
        match byte_mode_bits(payload, Version::Normal(v))
            .and_then(|bits| QrCode::with_bits(bits, EcLevel::H))
        {
            Ok(code) => {
                debug!("Encoded {} bytes as version {}", payload.len(), v);
                return Ok(code);
            }
            Err(QrError::DataTooLong) => continue,
            Err(e) => return Err(ConvertError::QrEncoding(format!("{e:?}"))),
        }
    }
    Err(ConvertError::PayloadTooLong { len: payload.len() })
}

fn byte_mode_bits(payload: &str, version: Version) -> Result<Bits, QrError> {
    let mut bits = Bits::new(version);
    bits.push_byte_data(payload.as_bytes())?;
    bits.push_terminator(EcLevel::H)?;
    Ok(bits)
}

/// Rasterise a symbol: `module_size` pixels per module, `border` modules of
/// white quiet zone on every side.
pub fn render_symbol(code: &QrCode, module_size: u32, border: u32) -> RgbaImage {
    let modules = code.width() as u32;
    let side = (modules + 2 * border) * module_size;
    let mut image = RgbaImage::from_pixel(side, side, WHITE);

    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let i = i as u32;
        let px = (border + i % modules) * module_size;
        let py = (border + i / modules) * module_size;
        for dy in 0..module_size {
            for dx in 0..module_size {
                image.put_pixel(px + dx, py + dy, BLACK);
            }
        }
    }

    image
}

/// Downscale `logo` so neither side exceeds `max_side`, keeping its aspect
/// ratio. Logos already within bounds are returned unchanged.
pub fn fit_logo(logo: RgbaImage, max_side: u32) -> RgbaImage {
    let max_side = max_side.max(1);
    let (w, h) = logo.dimensions();
    if w <= max_side && h <= max_side {
        return logo;
    }
    DynamicImage::ImageRgba8(logo)
        .resize(max_side, max_side, FilterType::Lanczos3)
        .to_rgba8()
}

/// Largest logo side allowed on an image `image_width` pixels wide whose
/// symbol (without quiet zone) spans `symbol_px` pixels.
pub fn logo_side_limit(image_width: u32, symbol_px: u32, style: &QrStyle) -> u32 {
    let by_ratio = image_width / style.logo_ratio;
    let by_coverage =
        (symbol_px * style.max_badge_coverage / 100).saturating_sub(2 * style.badge_padding);
    by_ratio.min(by_coverage).max(1)
}

/// Put `logo` on a white rounded-rectangle badge, `padding` pixels per side.
///
/// Outside the rounded corners the badge is fully transparent; inside it is
/// opaque, with the logo alpha-blended onto white.
pub fn build_badge(logo: &RgbaImage, padding: u32, corner_radius: u32) -> RgbaImage {
    let width = logo.width() + 2 * padding;
    let height = logo.height() + 2 * padding;
    let mut badge = RgbaImage::from_pixel(width, height, CLEAR);
    fill_rounded_rect(&mut badge, corner_radius, WHITE);

    let x = (width - logo.width()) / 2;
    let y = (height - logo.height()) / 2;
    imageops::overlay(&mut badge, logo, x as i64, y as i64);
    badge
}

/// Paint the whole canvas as a rounded rectangle of `color`.
fn fill_rounded_rect(canvas: &mut RgbaImage, radius: u32, color: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let r = radius.min(w / 2).min(h / 2);
    if r == 0 {
        draw_filled_rect_mut(canvas, Rect::at(0, 0).of_size(w, h), color);
        return;
    }

    if w > 2 * r {
        draw_filled_rect_mut(canvas, Rect::at(r as i32, 0).of_size(w - 2 * r, h), color);
    }
    if h > 2 * r {
        draw_filled_rect_mut(canvas, Rect::at(0, r as i32).of_size(w, h - 2 * r), color);
    }

    let (left, top) = (r as i32, r as i32);
    let (right, bottom) = ((w - 1 - r) as i32, (h - 1 - r) as i32);
    for centre in [(left, top), (right, top), (left, bottom), (right, bottom)] {
        draw_filled_circle_mut(canvas, centre, r as i32, color);
    }
}

/// Load, scale and composite the logo at the centre of `image`.
fn embed_logo(
    image: &mut RgbaImage,
    path: &Path,
    style: &QrStyle,
) -> Result<BadgePlacement, LogoError> {
    let logo = load_logo(path)?;
    let symbol_px = image
        .width()
        .saturating_sub(2 * style.border * style.module_size);
    let logo = fit_logo(logo, logo_side_limit(image.width(), symbol_px, style));
    let badge = build_badge(&logo, style.badge_padding, style.corner_radius);

    let x = (image.width() as i64 - badge.width() as i64).div_euclid(2);
    let y = (image.height() as i64 - badge.height() as i64).div_euclid(2);
    imageops::overlay(image, &badge, x, y);

    debug!(
        "Embedded {}x{} logo on {}x{} badge at ({}, {})",
        logo.width(),
        logo.height(),
        badge.width(),
        badge.height(),
        x,
        y
    );

    Ok(BadgePlacement {
        x,
        y,
        width: badge.width(),
        height: badge.height(),
        logo_width: logo.width(),
        logo_height: logo.height(),
    })
}

fn load_logo(path: &Path) -> Result<RgbaImage, LogoError> {
    let bytes = std::fs::read(path).map_err(|e| LogoError::Unreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let logo = image::load_from_memory(&bytes)
        .map_err(|e| LogoError::Decode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
        .to_rgba8();
    if logo.width() == 0 || logo.height() == 0 {
        return Err(LogoError::Degenerate {
            path: path.to_path_buf(),
            width: logo.width(),
            height: logo.height(),
        });
    }
    Ok(logo)
}

/// Encode as PNG in memory, then write in one call so a failed encode never
/// leaves a truncated file behind.
fn save_png(image: &RgbaImage, output_path: &Path) -> Result<(), ConvertError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    std::fs::write(output_path, &buf).map_err(|e| {
        let _ = std::fs::remove_file(output_path);
        ConvertError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        }
    })
}

fn version_number(version: Version) -> i16 {
    match version {
        Version::Normal(v) | Version::Micro(v) => v,
    }
}
