//! Encoder frameworks.
//!
//! A framework turns its configuration block into a command line and owns the
//! process it spawns. Drivers pick one by name from a [`FrameworkRegistry`]
//! and drive it through the [`Framework`] trait.

mod command;
mod ffmpeg;

pub use command::CommandFramework;
pub use ffmpeg::FfmpegFramework;

use livecam_av::{CommandLine, Waiter};
use livecam_core::{Result, SupervisorState};

use crate::registry::Registry;

/// A supervised encoder process.
pub trait Framework: Send + Sync {
    /// Spawn the encoder. Returns once the process is running.
    fn start(&self) -> Result<()>;

    /// Cancel the running encoder.
    fn stop(&self) -> Result<()>;

    /// Subscribe to the end of the current (or last) run.
    fn wait(&self) -> Waiter;

    fn state(&self) -> SupervisorState;

    /// The command line a start would spawn, without spawning it.
    fn render(&self) -> Result<CommandLine>;
}

/// Named arguments handed to every framework constructor.
#[derive(Debug, Clone)]
pub struct FrameworkArgs {
    /// Camera label attached to log events.
    pub camera: String,
}

/// Framework name → constructor.
pub type FrameworkRegistry = Registry<Box<dyn Framework>, FrameworkArgs>;

impl Registry<Box<dyn Framework>, FrameworkArgs> {
    /// Registry holding the frameworks shipped with livecam.
    pub fn builtin() -> Self {
        let mut registry = Self::new("framework");
        registry.register(FfmpegFramework::NAME, |config, args| {
            Ok(Box::new(FfmpegFramework::new(&config, args)?) as Box<dyn Framework>)
        });
        registry
    }
}
