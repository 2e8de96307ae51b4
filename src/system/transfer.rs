// src/system/transfer.rs

use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("curl could not be started (is it on PATH?): {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Upload of '{file}' failed (curl exit code {code}): {stderr}")]
    UploadFailed {
        file: String,
        code: i32,
        stderr: String,
    },
}

/// Uploads a single file to the root of an FTP url with `curl -T`.
///
/// curl carries the FTP protocol and credential handling; we only shell out.
/// Stdout is discarded, stderr is captured for the error report.
pub async fn upload_file(
    file: &Path,
    username: &str,
    password: &str,
    url: &str,
) -> Result<(), TransferError> {
    log::debug!("Uploading '{}' to {}", file.display(), url);

    let output = Command::new("curl")
        .arg("--silent")
        .arg("--show-error")
        .arg("-T")
        .arg(file)
        .arg("--user")
        .arg(format!("{username}:{password}"))
        .arg(url)
        .output()
        .await
        .map_err(TransferError::Spawn)?;

    if !output.status.success() {
        return Err(TransferError::UploadFailed {
            file: file.display().to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}
