//! PDF creation via pdfium: raster image → PDF and plain text → PDF.

use crate::config::{ServiceConfig, TextLayout};
use crate::error::ConvertError;
use crate::pipeline::engine;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Place `image_path` on a single page sized to the image (1 px = 1 pt).
///
/// Alpha is discarded first: PDF viewers disagree on how to render soft
/// masks, and the source image is expected to be a photo or scan.
pub fn image_to_pdf(
    image_path: &Path,
    output_path: &Path,
    config: &ServiceConfig,
) -> Result<(), ConvertError> {
    let image = image::open(image_path).map_err(|e| ConvertError::InvalidInput {
        path: image_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let image = DynamicImage::ImageRgb8(image.to_rgb8());
    let (width, height) = (
        PdfPoints::new(image.width() as f32),
        PdfPoints::new(image.height() as f32),
    );

    let pdfium = engine::bind(config)?;
    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| engine::pdf_error(output_path, e))?;

    let mut page = document
        .pages_mut()
        .create_page_at_end(PdfPagePaperSize::from_points(width, height))
        .map_err(|e| engine::pdf_error(output_path, e))?;
    let object = PdfPageImageObject::new_with_size(&document, &image, width, height)
        .map_err(|e| engine::pdf_error(output_path, e))?;
    page.objects_mut()
        .add_image_object(object)
        .map_err(|e| engine::pdf_error(output_path, e))?;

    document
        .save_to_file(output_path)
        .map_err(|e| engine::pdf_error(output_path, e))?;
    info!(
        "Image {}x{} written as PDF: {}",
        image.width(),
        image.height(),
        output_path.display()
    );
    Ok(())
}

/// Typeset `text` line by line in Helvetica, starting a new page whenever
/// the cursor would cross the bottom margin.
pub fn text_to_pdf(
    text: &str,
    output_path: &Path,
    config: &ServiceConfig,
) -> Result<(), ConvertError> {
    let layout = &config.text_layout;
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let pages = paginate(&lines, layout);

    let pdfium = engine::bind(config)?;
    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| engine::pdf_error(output_path, e))?;
    let font = document.fonts_mut().helvetica();

    for (page_idx, page_lines) in pages.iter().enumerate() {
        let size = PdfPagePaperSize::from_points(
            PdfPoints::new(layout.page_width),
            PdfPoints::new(layout.page_height),
        );
        let mut page = document
            .pages_mut()
            .create_page_at_end(size)
            .map_err(|e| engine::pdf_error(output_path, e))?;

        for (line_idx, line) in page_lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = layout.top - line_idx as f32 * layout.line_height;
            page.objects_mut()
                .create_text_object(
                    PdfPoints::new(layout.left_margin),
                    PdfPoints::new(y),
                    *line,
                    font,
                    PdfPoints::new(layout.font_size),
                )
                .map_err(|e| engine::pdf_error(output_path, e))?;
        }
        debug!("Typeset page {} ({} lines)", page_idx + 1, page_lines.len());
    }

    document
        .save_to_file(output_path)
        .map_err(|e| engine::pdf_error(output_path, e))?;
    info!(
        "Text of {} lines written as {}-page PDF: {}",
        lines.len(),
        pages.len(),
        output_path.display()
    );
    Ok(())
}

/// Split lines into page-sized chunks. Always yields at least one page so
/// an empty input still produces a valid (blank) document.
pub fn paginate<'a, 'b>(lines: &'b [&'a str], layout: &TextLayout) -> Vec<&'b [&'a str]> {
    if lines.is_empty() {
        return vec![lines];
    }
    lines.chunks(layout.lines_per_page().max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_splits_at_page_capacity() {
        let layout = TextLayout::default();
        let per_page = layout.lines_per_page();
        let owned: Vec<String> = (0..per_page * 2 + 3).map(|i| format!("line {i}")).collect();
        let lines: Vec<&str> = owned.iter().map(String::as_str).collect();

        let pages = paginate(&lines, &layout);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), per_page);
        assert_eq!(pages[2], &["line 96", "line 97", "line 98"][..]);
    }

    #[test]
    fn paginate_empty_text_yields_one_blank_page() {
        let pages = paginate(&[], &TextLayout::default());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }
}
