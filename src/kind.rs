//! The closed set of supported conversions.
//!
//! Requests name a conversion with a free-form label such as
//! `"PDF TO WORD"` or `"pdf-to-word"`. The label is normalised once into a
//! [`ConversionKind`]; everything downstream matches on the enum, so an
//! unsupported label fails up front instead of falling through a chain of
//! string comparisons.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Office document family handed to the office suite for PDF export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfficeFormat {
    Word,
    Presentation,
    Spreadsheet,
}

/// A supported conversion together with its input/output file contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionKind {
    /// `.pdf` → `.docx`
    PdfToWord,
    /// Word / PowerPoint / Excel → `.pdf` via the office suite.
    OfficeToPdf(OfficeFormat),
    /// `.pdf` → `.jpg` of the first page.
    PdfToImage,
    /// Raster image → single-page `.pdf`.
    ImageToPdf,
    /// Plain text → `.pdf`.
    TextToPdf,
    /// `.docx` → `.txt`
    WordToText,
    /// Any number of files → `.zip`.
    Zip,
    /// Text file holding a link → QR code `.png`, optionally logo-badged.
    LinkToQr,
}

impl ConversionKind {
    /// Every kind, in the order they are listed to users.
    pub const ALL: [ConversionKind; 10] = [
        ConversionKind::PdfToWord,
        ConversionKind::OfficeToPdf(OfficeFormat::Word),
        ConversionKind::OfficeToPdf(OfficeFormat::Presentation),
        ConversionKind::OfficeToPdf(OfficeFormat::Spreadsheet),
        ConversionKind::PdfToImage,
        ConversionKind::ImageToPdf,
        ConversionKind::TextToPdf,
        ConversionKind::WordToText,
        ConversionKind::Zip,
        ConversionKind::LinkToQr,
    ];

    /// Canonical upper-case label, as used in the `type` query parameter.
    pub fn label(&self) -> &'static str {
        match self {
            ConversionKind::PdfToWord => "PDF TO WORD",
            ConversionKind::OfficeToPdf(OfficeFormat::Word) => "WORD TO PDF",
            ConversionKind::OfficeToPdf(OfficeFormat::Presentation) => "PPT TO PDF",
            ConversionKind::OfficeToPdf(OfficeFormat::Spreadsheet) => "EXCEL TO PDF",
            ConversionKind::PdfToImage => "PDF TO IMAGE",
            ConversionKind::ImageToPdf => "IMAGE TO PDF",
            ConversionKind::TextToPdf => "TEXT TO PDF",
            ConversionKind::WordToText => "WORD TO TEXT",
            ConversionKind::Zip => "ZIP",
            ConversionKind::LinkToQr => "LINK TO QR CODE",
        }
    }

    /// Extension of the produced file, without the dot.
    pub fn output_extension(&self) -> &'static str {
        match self {
            ConversionKind::PdfToWord => "docx",
            ConversionKind::OfficeToPdf(_)
            | ConversionKind::ImageToPdf
            | ConversionKind::TextToPdf => "pdf",
            ConversionKind::PdfToImage => "jpg",
            ConversionKind::WordToText => "txt",
            ConversionKind::Zip => "zip",
            ConversionKind::LinkToQr => "png",
        }
    }

    /// Text appended to the input stem before the extension.
    pub fn output_suffix(&self) -> &'static str {
        match self {
            ConversionKind::LinkToQr => "_qr",
            _ => "",
        }
    }

    /// MIME type of the produced file.
    pub fn content_type(&self) -> &'static str {
        match self {
            ConversionKind::PdfToWord => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ConversionKind::OfficeToPdf(_)
            | ConversionKind::ImageToPdf
            | ConversionKind::TextToPdf => "application/pdf",
            ConversionKind::PdfToImage => "image/jpeg",
            ConversionKind::WordToText => "text/plain; charset=utf-8",
            ConversionKind::Zip => "application/zip",
            ConversionKind::LinkToQr => "image/png",
        }
    }

    /// Whether every uploaded file is consumed, rather than just the first.
    pub fn accepts_multiple_files(&self) -> bool {
        matches!(self, ConversionKind::Zip)
    }

    /// Whether the conversion needs the pdfium library.
    pub fn needs_pdfium(&self) -> bool {
        matches!(
            self,
            ConversionKind::PdfToWord
                | ConversionKind::PdfToImage
                | ConversionKind::ImageToPdf
                | ConversionKind::TextToPdf
        )
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Collapse case, URL-escaped spaces and separators into `"A TO B"` form.
fn normalise_label(raw: &str) -> String {
    raw.replace("%20", " ")
        .to_uppercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_' || c == '+')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl FromStr for ConversionKind {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalise_label(s);
        let kind = match label.as_str() {
            "PDF TO WORD" | "PDF TO DOCX" => ConversionKind::PdfToWord,
            "WORD TO PDF" | "DOCX TO PDF" => ConversionKind::OfficeToPdf(OfficeFormat::Word),
            "PPT TO PDF" | "POWERPOINT TO PDF" => {
                ConversionKind::OfficeToPdf(OfficeFormat::Presentation)
            }
            "EXCEL TO PDF" | "XLS TO PDF" | "XLSX TO PDF" => {
                ConversionKind::OfficeToPdf(OfficeFormat::Spreadsheet)
            }
            "PDF TO IMAGE" | "PDF TO JPG" => ConversionKind::PdfToImage,
            "IMAGE TO PDF" | "JPG TO PDF" | "PNG TO PDF" => ConversionKind::ImageToPdf,
            "TEXT TO PDF" | "TXT TO PDF" => ConversionKind::TextToPdf,
            "WORD TO TEXT" | "DOCX TO TEXT" | "WORD TO TXT" => ConversionKind::WordToText,
            "ZIP" | "FILES TO ZIP" => ConversionKind::Zip,
            "LINK TO QR CODE" | "LINK TO QR" | "QR CODE" | "QR" => ConversionKind::LinkToQr,
            _ => {
                return Err(ConvertError::UnknownConversion {
                    requested: s.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_labels() {
        assert_eq!("PDF TO WORD".parse::<ConversionKind>().unwrap(), ConversionKind::PdfToWord);
        assert_eq!(
            "ppt to pdf".parse::<ConversionKind>().unwrap(),
            ConversionKind::OfficeToPdf(OfficeFormat::Presentation)
        );
        assert_eq!(
            "Link%20To%20QR%20Code".parse::<ConversionKind>().unwrap(),
            ConversionKind::LinkToQr
        );
        assert_eq!("zip".parse::<ConversionKind>().unwrap(), ConversionKind::Zip);
    }

    #[test]
    fn parses_kebab_and_snake_case() {
        assert_eq!(
            "pdf-to-image".parse::<ConversionKind>().unwrap(),
            ConversionKind::PdfToImage
        );
        assert_eq!(
            "word_to_text".parse::<ConversionKind>().unwrap(),
            ConversionKind::WordToText
        );
        assert_eq!(
            "  text   to  pdf ".parse::<ConversionKind>().unwrap(),
            ConversionKind::TextToPdf
        );
    }

    #[test]
    fn rejects_unknown_and_substring_matches() {
        for bad in ["", "FAX TO PDF", "PDF TO WORD PLEASE", "ZIPPER"] {
            let err = bad.parse::<ConversionKind>().unwrap_err();
            assert!(
                matches!(err, ConvertError::UnknownConversion { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn labels_roundtrip_through_parse() {
        for kind in ConversionKind::ALL {
            assert_eq!(kind.label().parse::<ConversionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn only_zip_accepts_many_files() {
        let many: Vec<_> = ConversionKind::ALL
            .iter()
            .filter(|k| k.accepts_multiple_files())
            .collect();
        assert_eq!(many, vec![&ConversionKind::Zip]);
    }

    #[test]
    fn qr_output_contract() {
        let k = ConversionKind::LinkToQr;
        assert_eq!(k.output_extension(), "png");
        assert_eq!(k.output_suffix(), "_qr");
        assert_eq!(k.content_type(), "image/png");
        assert!(!k.needs_pdfium());
    }
}
