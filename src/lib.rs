//! # quickconvert
//!
//! Upload-and-download file conversion: PDF, Word, PowerPoint, Excel, image,
//! text and ZIP conversions, plus QR codes with a logo badge in the centre.
//!
//! ## Conversions
//!
//! | Label | Input | Output | Backend |
//! |-------|-------|--------|---------|
//! | `PDF TO WORD`     | `.pdf`            | `.docx` | pdfium text + docx-rs |
//! | `WORD TO PDF`     | `.doc`/`.docx`    | `.pdf`  | LibreOffice |
//! | `PPT TO PDF`      | `.ppt`/`.pptx`    | `.pdf`  | LibreOffice |
//! | `EXCEL TO PDF`    | `.xls`/`.xlsx`    | `.pdf`  | LibreOffice |
//! | `PDF TO IMAGE`    | `.pdf`            | `.jpg` (page 1) | pdfium |
//! | `IMAGE TO PDF`    | `.png`/`.jpg`     | `.pdf`  | pdfium |
//! | `TEXT TO PDF`     | `.txt`            | `.pdf`  | pdfium |
//! | `WORD TO TEXT`    | `.docx`           | `.txt`  | docx-rs |
//! | `ZIP`             | any, many         | `.zip`  | zip |
//! | `LINK TO QR CODE` | `.txt` with a URL | `_qr.png` | qrcode + image |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quickconvert::{convert, ConversionKind, ServiceConfig, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder()
//!         .upload_dir("/tmp/qc/uploads")
//!         .output_dir("/tmp/qc/outputs")
//!         .build()?;
//!     let link = UploadedFile::new("link.txt", "https://example.com");
//!     let output = convert(ConversionKind::LinkToQr, &[link], None, &config).await?;
//!     println!("{} ({} bytes)", output.path.display(), output.size_bytes);
//!     Ok(())
//! }
//! ```
//!
//! QR codes can also be generated directly with [`qr::generate`].
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum router and [`server::serve`] |
//! | `cli`    | on      | the `quickconvert` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! pdfium is loaded at runtime; see [`pipeline::engine`] for the lookup
//! order. LibreOffice is only needed for the office → PDF conversions.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod kind;
pub mod output;
pub mod pipeline;
pub mod qr;
#[cfg(feature = "server")]
pub mod server;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{QrStyle, ServiceConfig, ServiceConfigBuilder, TextLayout, DEFAULT_QR_PAYLOAD};
pub use convert::{convert, convert_paths, convert_sync};
pub use error::{ConvertError, LogoError};
pub use kind::{ConversionKind, OfficeFormat};
pub use output::ConversionOutput;
pub use qr::{generate, LogoOutcome, QrOutcome};
pub use upload::{sanitize_file_name, UploadedFile};
