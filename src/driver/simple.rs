//! The `simple` driver.
//!
//! ```toml
//! [driver]
//! name = "simple"
//!
//! [driver.inputs.0]
//! file = "/dev/video0"
//!
//! [driver.outputs.0]
//! file_prefix = "rtmp://server:1935/live"
//!
//! [driver.framework]
//! name = "ffmpeg"
//! # ...framework block, see livecam_av::ffmpeg
//! ```
//!
//! On every start the driver copies its `framework` block, sets
//! `inputs.<n>.file` from its own inputs and `outputs.<n>.file` to a fresh
//! endpoint under each `file_prefix`. The first output's endpoint is the one
//! published.

use std::sync::Arc;

use livecam_av::endpoint;
use livecam_core::{ConfigNode, DriverState, Error, Result};
use tokio::sync::watch;

use super::lifecycle::Lifecycle;
use super::{CameraDriver, DriverArgs, LaunchPlan};
use crate::framework::{Framework, FrameworkArgs, FrameworkRegistry};

pub struct SimpleDriver {
    config: ConfigNode,
    frameworks: Arc<FrameworkRegistry>,
    lifecycle: Arc<Lifecycle>,
}

impl SimpleDriver {
    /// Registry name.
    pub const NAME: &'static str = "simple";

    /// Create an OFF driver. Configuration is checked on each start.
    pub fn new(config: ConfigNode, args: &DriverArgs) -> Self {
        Self {
            config,
            frameworks: Arc::clone(&args.frameworks),
            lifecycle: Lifecycle::new(&args.camera, Arc::clone(&args.sink)),
        }
    }

    /// The framework block for one run, and the endpoint it publishes.
    fn prepare(&self) -> Result<(ConfigNode, String)> {
        let mut framework = self
            .config
            .sub("framework")
            .ok_or_else(|| Error::config("framework"))?;

        let inputs = indexed_blocks(&self.config, "inputs")?;
        for (key, input) in &inputs {
            let file = input.get_str("file");
            if file.is_empty() {
                return Err(Error::config(format!("inputs.{key}.file")));
            }
            framework.overlay(&format!("inputs.{key}.file"), file);
        }

        let outputs = indexed_blocks(&self.config, "outputs")?;
        let mut published = None;
        for (key, output) in &outputs {
            let path = format!("outputs.{key}.file_prefix");
            let prefix = output.get_str("file_prefix");
            if prefix.is_empty() {
                return Err(Error::config(path));
            }
            let url =
                endpoint::unique_endpoint(&prefix).map_err(|e| Error::invalid(path, e.to_string()))?;
            framework.overlay(&format!("outputs.{key}.file"), url.as_str());
            published.get_or_insert(url);
        }

        // indexed_blocks never returns an empty list.
        let endpoint = published.ok_or_else(|| Error::config("outputs"))?;
        Ok((framework, endpoint))
    }

    fn launch(&self) -> Result<(Box<dyn Framework>, String)> {
        let (node, endpoint) = self.prepare()?;
        let name = node.get_str("name");
        if name.is_empty() {
            return Err(Error::config("framework.name"));
        }
        let args = FrameworkArgs {
            camera: self.lifecycle.camera().to_string(),
        };
        let framework = self.frameworks.resolve(&name, node, &args)?;
        Ok((framework, endpoint))
    }
}

/// `(key, block)` pairs under `key`, or a config error when there are none.
fn indexed_blocks(node: &ConfigNode, key: &str) -> Result<Vec<(String, ConfigNode)>> {
    let parent = node.sub(key).ok_or_else(|| Error::config(key))?;
    let blocks: Vec<_> = parent
        .next_keys()
        .into_iter()
        .filter_map(|k| parent.sub(&k).map(|block| (k, block)))
        .collect();
    if blocks.is_empty() {
        return Err(Error::config(key));
    }
    Ok(blocks)
}

impl CameraDriver for SimpleDriver {
    fn start(&self) -> Result<()> {
        self.lifecycle.start(|| self.launch())
    }

    fn stop(&self) -> Result<()> {
        self.lifecycle.stop()
    }

    fn state(&self) -> DriverState {
        self.lifecycle.state()
    }

    fn subscribe(&self) -> watch::Receiver<DriverState> {
        self.lifecycle.subscribe()
    }

    fn render(&self) -> Result<LaunchPlan> {
        let (framework, endpoint) = self.launch()?;
        Ok(LaunchPlan {
            command: framework.render()?,
            endpoint,
        })
    }
}
