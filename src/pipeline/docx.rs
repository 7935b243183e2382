//! WordprocessingML (`.docx`) support on top of `docx-rs`.
//!
//! Writing produces one paragraph per text line on US-Letter pages, with a
//! page break run leading the first paragraph of every page after the first.
//!
//! Reading walks the body's top-level paragraphs only: runs and hyperlink
//! runs contribute their text, `<w:tab/>` becomes `\t` and `<w:br/>` becomes
//! `\n`. Tables, headers, footers and drawings (text boxes included) are
//! skipped, so a text box anchored mid-paragraph leaves the surrounding
//! text intact.

use crate::error::ConvertError;
use docx_rs::{
    BreakType, DocumentChild, Docx, Paragraph, ParagraphChild, Run, RunChild,
};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use tracing::{debug, info};

// US-Letter in twentieths of a point.
const PAGE_WIDTH: u32 = 12240;
const PAGE_HEIGHT: u32 = 15840;

// ── Writing ──────────────────────────────────────────────────────────────

/// Write `pages` (one string per page, lines separated by `\n`) as a docx file.
pub fn write_docx(pages: &[String], output_path: &Path) -> Result<(), ConvertError> {
    let file = File::create(output_path).map_err(|e| ConvertError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source: e,
    })?;
    write_docx_to(pages, file).map_err(|e| match e {
        ConvertError::Io(source) => ConvertError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    info!("DOCX written: {} ({} pages)", output_path.display(), pages.len());
    Ok(())
}

/// Write the docx package into any seekable sink.
pub fn write_docx_to<W: Write + Seek>(pages: &[String], sink: W) -> Result<(), ConvertError> {
    build_document(pages)
        .build()
        .pack(sink)
        .map_err(|e| ConvertError::Io(std::io::Error::other(e.to_string())))
}

fn build_document(pages: &[String]) -> Docx {
    let mut docx = Docx::new().page_size(PAGE_WIDTH, PAGE_HEIGHT);

    for (idx, page) in pages.iter().enumerate() {
        let mut lines = page.lines().peekable();
        if idx > 0 && lines.peek().is_none() {
            docx = docx.add_paragraph(page_break());
        }
        for (line_idx, line) in lines.enumerate() {
            let mut paragraph = if idx > 0 && line_idx == 0 {
                page_break()
            } else {
                Paragraph::new()
            };
            if let Some(run) = line_run(line) {
                paragraph = paragraph.add_run(run);
            }
            docx = docx.add_paragraph(paragraph);
        }
    }
    docx
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}

/// One run per line, with tab elements between tab-separated segments.
/// Blank lines yield no run and become empty paragraphs.
fn line_run(line: &str) -> Option<Run> {
    let line = strip_control(line.trim_end());
    if line.trim().is_empty() {
        return None;
    }
    let mut run = Run::new();
    for (i, segment) in line.split('\t').enumerate() {
        if i > 0 {
            run = run.add_tab();
        }
        if !segment.is_empty() {
            run = run.add_text(segment);
        }
    }
    Some(run)
}

/// Drop code points XML 1.0 forbids (pdfium occasionally reports form
/// feeds and NULs).
fn strip_control(text: &str) -> String {
    text.chars()
        .filter(|&c| match c {
            '\t' | '\n' | '\r' => true,
            '\u{FFFE}' | '\u{FFFF}' => false,
            c => (c as u32) >= 0x20,
        })
        .collect()
}

// ── Reading ──────────────────────────────────────────────────────────────

/// Extract the plain text of a docx file, one line per body paragraph.
pub fn read_docx(input_path: &Path) -> Result<String, ConvertError> {
    let bytes = std::fs::read(input_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
            path: input_path.to_path_buf(),
        },
        _ => ConvertError::Io(e),
    })?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| ConvertError::InvalidInput {
        path: input_path.to_path_buf(),
        reason: format!("not a Word document: {e}"),
    })?;
    debug!("{} body elements", docx.document.children.len());

    let text = document_text(&docx);
    info!(
        "DOCX read: {} ({} paragraphs)",
        input_path.display(),
        text.lines().count()
    );
    Ok(text)
}

fn document_text(docx: &Docx) -> String {
    docx.document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(&p.children)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(&mut text, run),
            ParagraphChild::Hyperlink(link) => text.push_str(&paragraph_text(&link.children)),
            _ => {}
        }
    }
    text
}

fn push_run_text(out: &mut String, run: &Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}
