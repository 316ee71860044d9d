mod types;

pub use types::*;

use anyhow::{Context, Result};
use livecam_core::ConfigNode;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::sink::{DirSink, MemorySink, ObjectSink};

/// Locations searched, in order, when no config path is given.
pub const DEFAULT_PATHS: &[&str] = &[
    "./livecam.toml",
    "./config.toml",
    "~/.config/livecam/config.toml",
    "/etc/livecam/config.toml",
];

/// A parsed configuration file.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// File the configuration came from.
    pub path: PathBuf,
    /// The whole document, as handed to the camera service.
    pub root: ConfigNode,
    pub host: HostSettings,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<LoadedConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let root = ConfigNode::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    let host: HostSettings = root
        .deserialize()
        .with_context(|| format!("Invalid host settings in {:?}", path))?;

    Ok(LoadedConfig {
        path: path.to_path_buf(),
        root,
        host,
    })
}

/// First existing file among [`DEFAULT_PATHS`].
pub fn find_config() -> Option<PathBuf> {
    DEFAULT_PATHS.iter().find_map(|path_str| {
        let path = PathBuf::from(shellexpand::tilde(path_str).as_ref());
        path.exists().then_some(path)
    })
}

/// Load `custom_path`, or the first config found in the default locations.
pub fn load_config_or_search(custom_path: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    match find_config() {
        Some(path) => load_config(&path),
        None => anyhow::bail!(
            "No config file found; pass --config or create one of: {}",
            DEFAULT_PATHS.join(", ")
        ),
    }
}

/// Build the sink described by `settings`.
pub fn build_sink(settings: &SinkSettings) -> Result<Arc<dyn ObjectSink>> {
    match settings.dir {
        Some(ref dir) => {
            let dir = PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).as_ref());
            let sink = DirSink::new(&dir)
                .with_context(|| format!("Failed to create sink directory: {:?}", dir))?;
            tracing::debug!("Publishing stream records to {:?}", dir);
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(MemorySink::new())),
    }
}
