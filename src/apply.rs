//! Handing a built patch to `git apply`.

use crate::patch::PatchPurpose;
use error_set::error_set;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;

error_set! {
    /// Errors from applying a patch
    ApplyError := {
        #[display("Failed to write patch file: {message}")]
        WriteFailed { message: String },
        #[display("Failed to spawn git apply: {message}")]
        SpawnFailed { message: String },
        #[display("git apply failed: {stderr}")]
        ApplyFailed { stderr: String },
    }
}

/// Apply `patch` to the index or working tree of the repository at `repo`,
/// as `purpose` requires. Returns whatever `git apply` printed.
///
/// The patch goes through a temporary file that is removed afterwards.
pub fn apply_patch(repo: &Path, patch: &[u8], purpose: PatchPurpose) -> Result<String, ApplyError> {
    let mut file = NamedTempFile::new().map_err(|e| ApplyError::WriteFailed {
        message: e.to_string(),
    })?;
    file.write_all(patch)
        .and_then(|()| file.flush())
        .map_err(|e| ApplyError::WriteFailed {
            message: e.to_string(),
        })?;

    log::debug!(
        "git -C {} apply {} {}",
        repo.display(),
        purpose.apply_args().join(" "),
        file.path().display()
    );
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .arg("apply")
        .args(purpose.apply_args())
        .arg(file.path())
        .output()
        .map_err(|e| ApplyError::SpawnFailed {
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        log::warn!("git apply ({purpose}) rejected the patch: {stderr}");
        return Err(ApplyError::ApplyFailed { stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
