//! Office document → PDF through a headless LibreOffice process.
//!
//! Runs `libreoffice --headless --convert-to pdf --outdir <dir> <input>`.
//! Each invocation gets its own user profile directory inside `out_dir`;
//! two LibreOffice processes sharing a profile block each other.

use crate::config::ServiceConfig;
use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Convert `input` to PDF, writing `<input stem>.pdf` into `out_dir`.
///
/// Returns the path LibreOffice wrote. The child is killed if the timeout
/// expires or the future is dropped.
pub async fn office_to_pdf(
    input: &Path,
    out_dir: &Path,
    config: &ServiceConfig,
) -> Result<PathBuf, ConvertError> {
    let tool = config.office_binary.clone();
    let out_dir = std::path::absolute(out_dir)?;
    let profile = out_dir.join("lo_profile");

    let mut cmd = Command::new(&tool);
    cmd.arg(format!("-env:UserInstallation=file://{}", profile.display()))
        .args(["--headless", "--norestore", "--convert-to", "pdf", "--outdir"])
        .arg(&out_dir)
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    debug!("Running {:?}", cmd.as_std());

    let limit = Duration::from_secs(config.office_timeout_secs);
    let output = match tokio::time::timeout(limit, cmd.output()).await {
        Err(_) => {
            warn!("{} exceeded {}s, killed", tool, limit.as_secs());
            return Err(ConvertError::ToolTimeout {
                tool,
                secs: limit.as_secs(),
            });
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConvertError::ToolNotFound { tool });
        }
        Ok(result) => result?,
    };

    if !output.status.success() {
        return Err(ConvertError::ExternalTool {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let produced = expected_output(input, &out_dir);
    if !produced.is_file() {
        // LibreOffice exits 0 for inputs it cannot open; it only says so on stdout.
        warn!(
            "{} reported success but wrote nothing: {}",
            tool,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        return Err(ConvertError::InvalidInput {
            path: input.to_path_buf(),
            reason: format!("{tool} could not convert this file"),
        });
    }
    info!("Office document converted: {}", produced.display());
    Ok(produced)
}

/// Where LibreOffice puts the PDF for `input`.
pub fn expected_output(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    out_dir.join(format!("{stem}.pdf"))
}

/// Whether the configured office binary can be launched at all.
pub fn is_available(config: &ServiceConfig) -> bool {
    std::process::Command::new(&config.office_binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_output_replaces_extension() {
        assert_eq!(
            expected_output(Path::new("/in/req_Report.v2.docx"), Path::new("/out")),
            PathBuf::from("/out/req_Report.v2.pdf")
        );
    }

    #[tokio::test]
    async fn missing_binary_is_tool_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("doc.docx");
        std::fs::write(&input, b"x").unwrap();
        let config = ServiceConfig::builder()
            .office_binary("quickconvert-no-such-office-binary")
            .build()
            .unwrap();

        let err = office_to_pdf(&input, tmp.path(), &config).await.unwrap_err();
        assert!(matches!(err, ConvertError::ToolNotFound { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_reports_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("doc.docx");
        std::fs::write(&input, b"x").unwrap();
        // `false` ignores its arguments and exits 1.
        let config = ServiceConfig::builder().office_binary("false").build().unwrap();

        let err = office_to_pdf(&input, tmp.path(), &config).await.unwrap_err();
        assert!(matches!(err, ConvertError::ExternalTool { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("slow.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let input = tmp.path().join("doc.docx");
        std::fs::write(&input, b"x").unwrap();
        let config = ServiceConfig::builder()
            .office_binary(script.to_string_lossy())
            .office_timeout_secs(1)
            .build()
            .unwrap();

        let err = office_to_pdf(&input, tmp.path(), &config).await.unwrap_err();
        assert!(
            matches!(err, ConvertError::ToolTimeout { secs: 1, .. }),
            "got {err:?}"
        );
    }
}
