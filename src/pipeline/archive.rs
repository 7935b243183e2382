//! ZIP packaging of uploaded files.

use crate::error::ConvertError;
use crate::upload::{split_name, UploadedFile};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write every upload into a ZIP at `output_path`, stored under its
/// sanitised name. Returns the entry names in upload order.
pub fn zip_uploads(files: &[UploadedFile], output_path: &Path) -> Result<Vec<String>, ConvertError> {
    let file = File::create(output_path).map_err(|e| ConvertError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source: e,
    })?;
    let names = zip_uploads_to(files, file)?;
    info!("ZIP written: {} ({} entries)", output_path.display(), names.len());
    Ok(names)
}

pub fn zip_uploads_to<W: Write + Seek>(
    files: &[UploadedFile],
    sink: W,
) -> Result<Vec<String>, ConvertError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(sink);
    let mut taken = HashSet::with_capacity(files.len());
    let mut names = Vec::with_capacity(files.len());

    for upload in files {
        let name = unique_entry_name(&upload.safe_name(), &mut taken);
        debug!("Adding {} ({} bytes)", name, upload.bytes.len());
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&upload.bytes)?;
        names.push(name);
    }

    zip.finish()?;
    Ok(names)
}

/// `name`, or `stem_N.ext` with the smallest `N ≥ 1` not yet in `taken`.
fn unique_entry_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = split_name(name);
    (1..)
        .map(|n| match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        })
        .find(|candidate| taken.insert(candidate.clone()))
        .unwrap_or_else(|| name.to_string())
}
