use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Host-level settings read from the same file as the camera configuration.
///
/// Camera keys (`name`, `[driver]`) are left to the driver registry; unknown
/// keys are ignored here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostSettings {
    /// Camera label used in logs.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub sink: SinkSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SinkSettings {
    /// Directory receiving one file per published key. Unset keeps the
    /// records in memory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}
