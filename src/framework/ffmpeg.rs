use livecam_av::{CommandLine, FfmpegFrameworkConfig, ProcessSupervisor, Waiter};
use livecam_core::{ConfigNode, Result, SupervisorState};
use tracing::debug;

use super::{Framework, FrameworkArgs};

/// The `ffmpeg` framework: argv assembled from structured blocks.
#[derive(Debug)]
pub struct FfmpegFramework {
    camera: String,
    config: FfmpegFrameworkConfig,
    supervisor: ProcessSupervisor,
}

impl FfmpegFramework {
    /// Registry name.
    pub const NAME: &'static str = "ffmpeg";

    /// Validate `config` and create an idle framework.
    pub fn new(config: &ConfigNode, args: &FrameworkArgs) -> Result<Self> {
        Ok(Self {
            camera: args.camera.clone(),
            config: FfmpegFrameworkConfig::from_node(config)?,
            supervisor: ProcessSupervisor::new(&args.camera),
        })
    }

    pub fn config(&self) -> &FfmpegFrameworkConfig {
        &self.config
    }
}

impl Framework for FfmpegFramework {
    fn start(&self) -> Result<()> {
        let rendered = self.config.command_line()?;
        debug!(camera = %self.camera, endpoints = ?rendered.endpoints, "starting ffmpeg");
        self.supervisor.start(&rendered.command)
    }

    fn stop(&self) -> Result<()> {
        self.supervisor.stop()
    }

    fn wait(&self) -> Waiter {
        self.supervisor.wait()
    }

    fn state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    fn render(&self) -> Result<CommandLine> {
        Ok(self.config.command_line()?.command)
    }
}
