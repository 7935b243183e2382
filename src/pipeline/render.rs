//! PDF rasterisation: render the first page to a JPEG via pdfium.
//!
//! Output size is bounded by `max_rendered_pixels` on the longest edge
//! rather than by a DPI, so a poster-sized page costs no more memory than
//! a Letter page.

use crate::config::ServiceConfig;
use crate::error::ConvertError;
use crate::pipeline::engine;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Render page 1 of `pdf_path` and write it to `output_path` as JPEG.
///
/// Blocking; callers on the async runtime go through `spawn_blocking`.
pub fn pdf_to_jpeg(
    pdf_path: &Path,
    output_path: &Path,
    config: &ServiceConfig,
) -> Result<(), ConvertError> {
    let image = render_first_page(pdf_path, config)?;
    write_jpeg(&image, output_path, config.jpeg_quality)
}

/// Rasterise page 1 with its longest edge capped at `max_rendered_pixels`.
pub fn render_first_page(
    pdf_path: &Path,
    config: &ServiceConfig,
) -> Result<DynamicImage, ConvertError> {
    let pdfium = engine::bind(config)?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| engine::pdf_error(pdf_path, e))?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());
    if pages.len() == 0 {
        return Err(ConvertError::EmptyDocument {
            path: pdf_path.to_path_buf(),
        });
    }

    let max_pixels = config.max_rendered_pixels as i32;
    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels)
        .set_maximum_height(max_pixels);

    let page = pages.get(0).map_err(|e| engine::pdf_error(pdf_path, e))?;
    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| engine::pdf_error(pdf_path, e))?;

    let image = bitmap.as_image();
    debug!("Rendered page 1 → {}x{} px", image.width(), image.height());
    Ok(image)
}

/// Flatten to RGB and encode as JPEG at `quality`.
pub fn write_jpeg(
    image: &DynamicImage,
    output_path: &Path,
    quality: u8,
) -> Result<(), ConvertError> {
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
    std::fs::write(output_path, &buf).map_err(|e| ConvertError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn jpeg_drops_alpha_and_keeps_size() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("page.jpg");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 32, Rgba([10, 200, 30, 128])));

        write_jpeg(&img, &out, 90).unwrap();

        let back = image::open(&out).unwrap();
        assert_eq!((back.width(), back.height()), (64, 32));
        assert!(!back.color().has_alpha());
    }

    #[test]
    fn missing_pdf_is_an_error() {
        let config = ServiceConfig::default();
        if !engine::is_available(&config) {
            println!("SKIP: pdfium library not available");
            return;
        }
        let err = render_first_page(Path::new("/no/such/file.pdf"), &config).unwrap_err();
        assert!(matches!(err, ConvertError::Pdf { .. }));
    }
}
