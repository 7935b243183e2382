//! Conversion entry points.
//!
//! [`convert`] takes uploaded files, stages them in a per-request directory,
//! runs the backend for the requested [`ConversionKind`] and persists the
//! result into `output_dir`.
//!
//! ## Output lifecycle
//!
//! Backends never write to the final path. They write to a hidden
//! `.partial_*` file in `output_dir` which is renamed into place only after
//! the stage succeeds and the file is non-empty. Any error drops the
//! partial file, so a failed request leaves nothing behind in either
//! directory.

use crate::config::ServiceConfig;
use crate::error::ConvertError;
use crate::kind::ConversionKind;
use crate::output::ConversionOutput;
use crate::pipeline::{archive, compose, docx, extract, office, render};
use crate::qr::{self, QrOutcome};
use crate::upload::{split_name, RequestId, StagingArea, UploadedFile};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run `kind` over `files` and return the persisted artifact.
///
/// Only [`ConversionKind::Zip`] consumes every file; the other kinds use
/// the first and ignore the rest. `logo` is only read by
/// [`ConversionKind::LinkToQr`]; without it the configured default logo is
/// used, if any.
///
/// # Errors
/// * [`ConvertError::NoInput`]: `files` is empty or the first file has no name.
/// * [`ConvertError::OutputMissing`]: the backend reported success but the
///   artifact is empty.
/// * Any backend error from [`crate::pipeline`] or [`crate::qr`].
pub async fn convert(
    kind: ConversionKind,
    files: &[UploadedFile],
    logo: Option<&UploadedFile>,
    config: &ServiceConfig,
) -> Result<ConversionOutput, ConvertError> {
    let start = Instant::now();
    let first = files
        .first()
        .filter(|f| !f.file_name.is_empty())
        .ok_or(ConvertError::NoInput)?;
    if files.len() > 1 && !kind.accepts_multiple_files() {
        warn!(
            "{} uses only the first file; ignoring {} more",
            kind,
            files.len() - 1
        );
    }

    config.ensure_dirs()?;
    let request = RequestId::new();
    let staging = StagingArea::new(&config.upload_dir, &request)?;
    let file_name = output_file_name(kind, &request, first);
    let final_path = config.output_dir.join(&file_name);
    info!("[{}] {} → {}", request, kind, file_name);

    let partial = tempfile::Builder::new()
        .prefix(".partial_")
        .suffix(&format!(".{}", kind.output_extension()))
        .tempfile_in(&config.output_dir)
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: final_path.clone(),
            source: e,
        })?
        .into_temp_path();

    let qr = run_stage(kind, files, first, logo, &staging, &partial, config).await?;

    let size_bytes = std::fs::metadata(&partial).map(|m| m.len()).unwrap_or(0);
    if size_bytes == 0 {
        return Err(ConvertError::OutputMissing {
            kind: kind.label().to_string(),
        });
    }
    partial
        .persist(&final_path)
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: final_path.clone(),
            source: e.error,
        })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "[{}] {} done: {} bytes in {}ms",
        request, kind, size_bytes, duration_ms
    );
    Ok(ConversionOutput {
        kind,
        path: final_path,
        file_name,
        content_type: kind.content_type().to_string(),
        size_bytes,
        duration_ms,
        qr,
    })
}

/// Read `paths` from disk and run [`convert`] over them.
pub async fn convert_paths(
    kind: ConversionKind,
    paths: &[PathBuf],
    logo: Option<&Path>,
    config: &ServiceConfig,
) -> Result<ConversionOutput, ConvertError> {
    let files = paths
        .iter()
        .map(|p| UploadedFile::from_path(p))
        .collect::<Result<Vec<_>, _>>()?;
    let logo = logo.map(UploadedFile::from_path).transpose()?;
    convert(kind, &files, logo.as_ref(), config).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    kind: ConversionKind,
    files: &[UploadedFile],
    logo: Option<&UploadedFile>,
    config: &ServiceConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(kind, files, logo, config))
}

/// Name of the artifact in `output_dir`.
///
/// `{request}_{stem}{suffix}.{ext}` for single-file kinds, where `stem` is
/// the sanitised upload name without extension; `converted_{request}.zip`
/// for archives.
pub fn output_file_name(kind: ConversionKind, request: &RequestId, first: &UploadedFile) -> String {
    if kind == ConversionKind::Zip {
        return format!("converted_{request}.zip");
    }
    let safe = first.safe_name();
    let (stem, _) = split_name(&safe);
    format!(
        "{request}_{stem}{}.{}",
        kind.output_suffix(),
        kind.output_extension()
    )
}

// ── Stage dispatch ───────────────────────────────────────────────────────

async fn run_stage(
    kind: ConversionKind,
    files: &[UploadedFile],
    first: &UploadedFile,
    logo: Option<&UploadedFile>,
    staging: &StagingArea,
    out: &Path,
    config: &ServiceConfig,
) -> Result<Option<QrOutcome>, ConvertError> {
    let out = out.to_path_buf();
    match kind {
        ConversionKind::PdfToWord => {
            let input = staging.stage(first, "")?;
            let cfg = config.clone();
            blocking("PDF TO WORD", move || {
                let pages = extract::extract_pages(&input, &cfg)?;
                debug!("Extracted {} pages of text", pages.len());
                docx::write_docx(&pages, &out)
            })
            .await?;
        }
        ConversionKind::OfficeToPdf(format) => {
            let input = staging.stage(first, "")?;
            let work_dir = staging.path().join("office");
            std::fs::create_dir_all(&work_dir)?;
            debug!("Office format: {:?}", format);
            let produced = office::office_to_pdf(&input, &work_dir, config).await?;
            tokio::fs::copy(&produced, &out)
                .await
                .map_err(|e| ConvertError::OutputWriteFailed {
                    path: out.clone(),
                    source: e,
                })?;
        }
        ConversionKind::PdfToImage => {
            let input = staging.stage(first, "")?;
            let cfg = config.clone();
            blocking("PDF TO IMAGE", move || {
                render::pdf_to_jpeg(&input, &out, &cfg)
            })
            .await?;
        }
        ConversionKind::ImageToPdf => {
            let input = staging.stage(first, "")?;
            let cfg = config.clone();
            blocking("IMAGE TO PDF", move || {
                compose::image_to_pdf(&input, &out, &cfg)
            })
            .await?;
        }
        ConversionKind::TextToPdf => {
            let text = decode_text(&first.bytes);
            let cfg = config.clone();
            blocking("TEXT TO PDF", move || compose::text_to_pdf(&text, &out, &cfg)).await?;
        }
        ConversionKind::WordToText => {
            let input = staging.stage(first, "")?;
            blocking("WORD TO TEXT", move || {
                let text = docx::read_docx(&input)?;
                std::fs::write(&out, text).map_err(|e| ConvertError::OutputWriteFailed {
                    path: out.clone(),
                    source: e,
                })
            })
            .await?;
        }
        ConversionKind::Zip => {
            let uploads = files.to_vec();
            blocking("ZIP", move || archive::zip_uploads(&uploads, &out).map(drop)).await?;
        }
        ConversionKind::LinkToQr => {
            let payload = decode_text(&first.bytes).trim().to_string();
            let logo_path = match logo.filter(|l| !l.file_name.is_empty()) {
                Some(upload) => Some(staging.stage(upload, "logo_")?),
                None => config.default_logo.clone(),
            };
            let style = config.qr.clone();
            let outcome = blocking("LINK TO QR CODE", move || {
                qr::generate(&payload, logo_path.as_deref(), &out, &style)
            })
            .await?;
            return Ok(Some(outcome));
        }
    }
    Ok(None)
}

/// Decode uploaded text as UTF-8, dropping invalid byte sequences rather
/// than replacing them with U+FFFD.
fn decode_text(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Run a blocking stage on tokio's blocking pool.
async fn blocking<T, F>(stage: &'static str, f: F) -> Result<T, ConvertError>
where
    F: FnOnce() -> Result<T, ConvertError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ConvertError::Internal(format!("{} task panicked: {}", stage, e)))?
}
