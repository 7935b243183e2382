//! Request-scoped staging of uploaded files.
//!
//! Every request writes its uploads into a private [`StagingArea`], a
//! `TempDir` under the configured upload directory. Dropping the area
//! deletes everything in it, including uploaded logos, whether the
//! request succeeded or not.

use crate::error::ConvertError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// A file received from a client: its claimed name and its bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file, keeping only its final path component as the name.
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ConvertError::Io(e),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Filename made safe for the local file system.
    pub fn safe_name(&self) -> String {
        sanitize_file_name(&self.file_name)
    }
}

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Make a client-supplied filename safe to join onto a local directory.
///
/// The name is NFKD-decomposed and non-ASCII code points are dropped, so
/// accented letters keep their base letter. Path separators become spaces,
/// whitespace runs collapse to `_`, anything outside `[A-Za-z0-9_.-]` is
/// dropped, and leading/trailing `.` and `_` are trimmed, so
/// `"../../etc/passwd"` becomes `"etc_passwd"`. A name that sanitises to
/// nothing becomes `"upload"`.
pub fn sanitize_file_name(name: &str) -> String {
    let ascii: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| match c {
            '/' | '\\' => ' ',
            c => c,
        })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split a sanitised name into `(stem, extension)`; the extension excludes the dot.
pub fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], Some(&name[i + 1..])),
        _ => (name, None),
    }
}

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier prefixed to every file a request produces.
///
/// Millisecond timestamp plus a process-wide counter, so two requests in
/// the same millisecond still get distinct output paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{millis}-{seq:04x}"))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request temporary directory holding staged uploads.
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a fresh staging directory under `upload_dir`, creating
    /// `upload_dir` itself if needed.
    pub fn new(upload_dir: &Path, request: &RequestId) -> Result<Self, ConvertError> {
        std::fs::create_dir_all(upload_dir)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("req_{request}_"))
            .tempdir_in(upload_dir)?;
        debug!("Staging area: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `file` into the staging area under `{prefix}{safe name}` and
    /// return its path.
    pub fn stage(&self, file: &UploadedFile, prefix: &str) -> Result<PathBuf, ConvertError> {
        let path = self.dir.path().join(format!("{prefix}{}", file.safe_name()));
        std::fs::write(&path, &file.bytes)?;
        debug!("Staged {} bytes → {}", file.bytes.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_matches_secure_filename_cases() {
        assert_eq!(sanitize_file_name("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(sanitize_file_name("../../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_file_name("report (final).pdf"), "report_final.pdf");
        assert_eq!(sanitize_file_name("C:\\docs\\cv.docx"), "C_docs_cv.docx");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
    }

    #[test]
    fn sanitize_folds_accents_to_ascii() {
        assert_eq!(sanitize_file_name("café résumé.txt"), "cafe_resume.txt");
        assert_eq!(sanitize_file_name("Ångström ﬁle.pdf"), "Angstrom_file.pdf");
    }

    #[test]
    fn sanitize_never_returns_empty() {
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name("../.."), "upload");
        assert_eq!(sanitize_file_name("文档.pdf"), "pdf");
    }

    #[test]
    fn split_name_handles_missing_extension() {
        assert_eq!(split_name("a.tar.gz"), ("a.tar", Some("gz")));
        assert_eq!(split_name("notes"), ("notes", None));
        assert_eq!(split_name("link.txt"), ("link", Some("txt")));
    }

    #[test]
    fn request_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| RequestId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn staging_area_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let staged_path;
        {
            let area = StagingArea::new(root.path(), &RequestId::new()).unwrap();
            staged_path = area
                .stage(&UploadedFile::new("../evil name.txt", "hi"), "in_")
                .unwrap();
            assert!(staged_path.starts_with(area.path()));
            assert_eq!(
                staged_path.file_name().unwrap().to_str().unwrap(),
                "in_evil_name.txt"
            );
            assert_eq!(std::fs::read_to_string(&staged_path).unwrap(), "hi");
        }
        assert!(!staged_path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = UploadedFile::from_path(Path::new("/no/such/input.pdf")).unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }));
    }
}
