//! Text extraction from PDF pages via pdfium.

use crate::config::ServiceConfig;
use crate::error::ConvertError;
use crate::pipeline::engine;
use std::path::Path;
use tracing::{debug, info};

/// Extract the text of every page, in page order.
///
/// Pages without a text layer (scans) yield an empty string rather than an
/// error, so page numbering is preserved.
pub fn extract_pages(pdf_path: &Path, config: &ServiceConfig) -> Result<Vec<String>, ConvertError> {
    let pdfium = engine::bind(config)?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| engine::pdf_error(pdf_path, e))?;

    let pages = document.pages();
    info!("Extracting text from {} pages", pages.len());

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let text = match page.text() {
            Ok(t) => t.all(),
            Err(e) => {
                debug!("Page {} has no text layer: {:?}", idx + 1, e);
                String::new()
            }
        };
        texts.push(normalise_line_endings(&text));
    }
    Ok(texts)
}

/// pdfium reports line breaks as `\r\n`; keep plain `\n`.
fn normalise_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings_are_normalised() {
        assert_eq!(normalise_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
