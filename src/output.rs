//! Result types returned by a successful conversion.

use crate::kind::ConversionKind;
use crate::qr::QrOutcome;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A produced artifact, ready to be served or reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub kind: ConversionKind,
    /// Final location in the output directory.
    pub path: PathBuf,
    /// File name offered to clients (`Content-Disposition`).
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    /// Wall-clock time from staging to persisted output.
    pub duration_ms: u64,
    /// Symbol details, for `LINK TO QR CODE` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr: Option<QrOutcome>,
}

impl ConversionOutput {
    /// Whether a QR conversion fell back to a plain symbol because the logo
    /// could not be used.
    pub fn logo_failed(&self) -> bool {
        matches!(
            self.qr.as_ref().map(|q| &q.logo),
            Some(crate::qr::LogoOutcome::Failed(_))
        )
    }
}
