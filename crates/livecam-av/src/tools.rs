//! Encoder binary discovery.
//!
//! Cameras name their encoder either as a bare program (`ffmpeg`), looked up
//! on `PATH` with [`which`], or as an explicit path, which is used as-is when
//! it exists.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Availability information for one encoder binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// The binary as configured.
    pub name: String,
    /// Whether the binary was found.
    pub available: bool,
    /// First line of the version banner, if the binary printed one.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Resolve `binary` to an executable path.
pub fn locate(binary: &str) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    which::which(binary).ok()
}

/// Locate `binary` and probe its version.
pub fn inspect(binary: &str) -> ToolInfo {
    match locate(binary) {
        Some(path) => ToolInfo {
            name: binary.to_string(),
            available: true,
            version: detect_version(&path),
            path: Some(path),
        },
        None => ToolInfo {
            name: binary.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .stdin(std::process::Stdio::null())
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}
