//! Camera drivers.
//!
//! A driver owns the ON/OFF state of one camera. Starting it derives the
//! encoder configuration, launches a [`Framework`](crate::framework::Framework)
//! and publishes the stream endpoint to the host's [`ObjectSink`]. When the
//! encoder ends, by `stop` or on its own, the endpoint is retracted and the
//! state published as `off`.
//!
//! Built-in drivers:
//!
//! - [`SimpleDriver`] (`simple`): overlays input files and a unique output
//!   endpoint onto a nested `framework` block and runs the framework it names.
//! - [`FfmpegSimpleDriver`] (`ffmpeg_simple`): renders a command template for
//!   one input and one output.

mod ffmpeg_simple;
mod lifecycle;
mod simple;

pub use ffmpeg_simple::FfmpegSimpleDriver;
pub use lifecycle::Publication;
pub use simple::SimpleDriver;

use std::sync::Arc;

use livecam_av::ffmpeg::DEFAULT_BINARY;
use livecam_av::CommandLine;
use livecam_core::{ConfigNode, DriverState, Result};
use tokio::sync::watch;

use crate::framework::FrameworkRegistry;
use crate::registry::Registry;
use crate::sink::ObjectSink;

/// Sink key holding the current stream endpoint.
pub const ENDPOINT_KEY: &str = "rtmp";
/// Sink key holding `"on"` or `"off"`.
pub const STATE_KEY: &str = "state";

/// A camera that can be switched on and off.
pub trait CameraDriver: Send + Sync {
    /// Launch the encoder and publish the stream.
    ///
    /// Fails with [`Error::NotStartable`](livecam_core::Error::NotStartable)
    /// when already on.
    fn start(&self) -> Result<()>;

    /// Stop the encoder and retract the stream.
    ///
    /// Fails with [`Error::NotStoppable`](livecam_core::Error::NotStoppable)
    /// when already off.
    fn stop(&self) -> Result<()>;

    fn state(&self) -> DriverState;

    /// Watch state transitions.
    fn subscribe(&self) -> watch::Receiver<DriverState>;

    /// What a start would run, without spawning anything.
    fn render(&self) -> Result<LaunchPlan>;
}

/// A dry-run view of a start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub command: CommandLine,
    pub endpoint: String,
}

/// Named arguments handed to every driver constructor.
#[derive(Clone)]
pub struct DriverArgs {
    /// Camera label attached to log events.
    pub camera: String,
    /// Where stream metadata is published.
    pub sink: Arc<dyn ObjectSink>,
    /// Frameworks a driver may launch.
    pub frameworks: Arc<FrameworkRegistry>,
}

/// Driver name → constructor.
pub type DriverRegistry = Registry<Box<dyn CameraDriver>, DriverArgs>;

impl Registry<Box<dyn CameraDriver>, DriverArgs> {
    /// Registry holding the drivers shipped with livecam.
    pub fn builtin() -> Self {
        let mut registry = Self::new("camera driver");
        registry
            .register(SimpleDriver::NAME, |config, args| {
                Ok(Box::new(SimpleDriver::new(config, args)) as Box<dyn CameraDriver>)
            })
            .register(FfmpegSimpleDriver::NAME, |config, args| {
                Ok(Box::new(FfmpegSimpleDriver::new(&config, args)?) as Box<dyn CameraDriver>)
            });
        registry
    }
}

/// Encoder binary a `driver` block will run.
pub fn encoder_binary(driver: &ConfigNode) -> String {
    if driver.get_str("name") == FfmpegSimpleDriver::NAME {
        driver.get_str_or("ffmpeg_file", DEFAULT_BINARY)
    } else {
        driver.get_str_or("framework.binary", DEFAULT_BINARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_drivers() {
        assert_eq!(
            DriverRegistry::builtin().names(),
            ["ffmpeg_simple", "simple"]
        );
    }

    #[test]
    fn encoder_binary_per_driver() {
        let simple = ConfigNode::from_pairs([("name", "simple"), ("framework.binary", "/opt/ff")]);
        assert_eq!(encoder_binary(&simple), "/opt/ff");

        let templated = ConfigNode::from_pairs([("name", "ffmpeg_simple")]);
        assert_eq!(encoder_binary(&templated), "ffmpeg");
    }
}
