//! Error types for the quickconvert library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`]: **Fatal**: the conversion cannot produce an
//!   artifact (unknown conversion kind, unreadable input, unwritable
//!   destination, external tool failed). Returned as `Err(ConvertError)`
//!   from [`crate::convert::convert`] and [`crate::qr::generate`].
//!
//! * [`LogoError`]: **Non-fatal**: the optional logo could not be
//!   embedded in a QR code. The plain symbol is still written and the
//!   error is carried inside [`crate::qr::LogoOutcome::Failed`] so callers
//!   can report it without losing the artifact.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the quickconvert library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The requested conversion type is not one of the supported kinds.
    #[error("Unsupported conversion type '{requested}'")]
    UnknownConversion { requested: String },

    /// The request carried no file to convert.
    #[error("No file selected")]
    NoInput,

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The input exists but is not usable for the requested conversion.
    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    // ── QR errors ─────────────────────────────────────────────────────────
    /// Payload does not fit a version-40 symbol at the configured EC level.
    #[error("QR payload of {len} bytes exceeds the capacity of a version 40 symbol")]
    PayloadTooLong { len: usize },

    /// The QR encoder rejected the payload for another reason.
    #[error("QR encoding failed: {0}")]
    QrEncoding(String),

    // ── Backend errors ────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set QUICKCONVERT_PDFIUM_LIB (or --pdfium-lib) to the directory holding libpdfium."
    )]
    PdfiumBindingFailed(String),

    /// pdfium returned an error while loading, reading or writing a document.
    #[error("PDF processing failed for '{path}': {detail}")]
    Pdf { path: PathBuf, detail: String },

    /// The PDF loaded fine but has no pages.
    #[error("PDF '{path}' has no pages")]
    EmptyDocument { path: PathBuf },

    /// Raster decode/encode failed.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// Zip archive read/write failed.
    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The external tool could not be launched because it is not installed.
    #[error("External tool '{tool}' not found on PATH\nInstall LibreOffice or set QUICKCONVERT_OFFICE_BIN.")]
    ToolNotFound { tool: String },

    /// The external tool ran but reported failure.
    #[error("External tool '{tool}' failed with status {status}: {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    /// The external tool did not finish within the configured timeout.
    #[error("External tool '{tool}' timed out after {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend returned success but produced no artifact.
    #[error("Failed to generate output for: {kind}")]
    OutputMissing { kind: String },

    /// Generic I/O failure while staging inputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Whether the error was caused by the request rather than the service.
    ///
    /// The HTTP layer maps these to `400 Bad Request`.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ConvertError::UnknownConversion { .. }
                | ConvertError::NoInput
                | ConvertError::InvalidInput { .. }
                | ConvertError::PayloadTooLong { .. }
        )
    }
}

/// A non-fatal error while embedding a logo into a QR code.
///
/// Stored in [`crate::qr::LogoOutcome::Failed`]; the QR image is still
/// written without the badge.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LogoError {
    /// The logo file could not be read.
    #[error("Logo '{path}' could not be read: {detail}")]
    Unreadable { path: PathBuf, detail: String },

    /// The logo bytes are not a decodable image.
    #[error("Logo '{path}' could not be decoded: {detail}")]
    Decode { path: PathBuf, detail: String },

    /// The logo decoded to an image with a zero dimension.
    #[error("Logo '{path}' is empty ({width}x{height})")]
    Degenerate {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}
