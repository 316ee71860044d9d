//! The `ffmpeg_simple` driver: one input, one output, rendered from a command
//! template. See [`FfmpegSimpleConfig`] for the configuration layout.

use std::sync::Arc;

use livecam_av::FfmpegSimpleConfig;
use livecam_core::{ConfigNode, DriverState, Result};
use tokio::sync::watch;

use super::lifecycle::Lifecycle;
use super::{CameraDriver, DriverArgs, LaunchPlan};
use crate::framework::{CommandFramework, Framework};

pub struct FfmpegSimpleDriver {
    config: FfmpegSimpleConfig,
    lifecycle: Arc<Lifecycle>,
}

impl FfmpegSimpleDriver {
    /// Registry name.
    pub const NAME: &'static str = "ffmpeg_simple";

    /// Validate `config` and create an OFF driver.
    pub fn new(config: &ConfigNode, args: &DriverArgs) -> Result<Self> {
        let config = FfmpegSimpleConfig::from_node(config)?;
        Ok(Self {
            config,
            lifecycle: Lifecycle::new(&args.camera, Arc::clone(&args.sink)),
        })
    }

    pub fn config(&self) -> &FfmpegSimpleConfig {
        &self.config
    }

    fn launch(&self) -> Result<(Box<dyn Framework>, String)> {
        let rendered = self.config.render()?;
        let framework = CommandFramework::new(self.lifecycle.camera(), rendered.command);
        Ok((Box::new(framework), rendered.endpoint))
    }
}

impl CameraDriver for FfmpegSimpleDriver {
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
        let rendered = self.config.render()?;
        Ok(LaunchPlan {
            command: rendered.command,
            endpoint: rendered.endpoint,
        })
    }
}
