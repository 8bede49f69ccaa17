//! Where finished plots go: a file on disk or an external viewer.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::error::{ReportsError, ReportsResult};

/// Write `bytes` to `path`, creating parent directories and replacing any
/// earlier file.
pub fn write_plot(path: &Path, bytes: &[u8]) -> ReportsResult<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "Wrote plot");
    Ok(path.to_path_buf())
}

/// Open `bytes` as a temporary PNG in `viewer` and block until it exits.
///
/// `viewer` is split on whitespace: the first word is the program and the
/// rest are passed before the file path.
pub fn show_in_viewer(viewer: &str, bytes: &[u8]) -> ReportsResult<()> {
    let mut words = viewer.split_whitespace();
    let program = words.next().ok_or_else(|| ReportsError::Viewer {
        command: viewer.to_string(),
        reason: "empty command".to_string(),
    })?;

    let mut file = tempfile::Builder::new()
        .prefix("ff_plot_")
        .suffix(".png")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;

    info!(viewer, path = %file.path().display(), "Opening plot in viewer");
    let status = Command::new(program)
        .args(words)
        .arg(file.path())
        .status()
        .map_err(|e| ReportsError::Viewer {
            command: viewer.to_string(),
            reason: e.to_string(),
        })?;

    if !status.success() {
        return Err(ReportsError::Viewer {
            command: viewer.to_string(),
            reason: format!("exited with {}", status),
        });
    }
    Ok(())
}
