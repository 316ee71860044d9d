//! Shared helpers for integration tests.
//!
//! [`FakeEncoder`] writes a small shell script standing in for ffmpeg. It
//! records its argv to a file and then either keeps running or exits after a
//! short delay, which is all the drivers observe of a real encoder.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use livecam::driver::{CameraDriver, DriverArgs};
use livecam::framework::FrameworkRegistry;
use livecam::sink::{MemorySink, ObjectSink, SinkOp};
use livecam_core::{ConfigNode, DriverState, Error, Result};
use tempfile::TempDir;
use tokio::sync::watch;

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// A stand-in encoder script living in its own temp directory.
pub struct FakeEncoder {
    _dir: TempDir,
    pub path: PathBuf,
    pub args_file: PathBuf,
    pub pid_file: PathBuf,
}

impl FakeEncoder {
    /// Encoder that keeps running until killed.
    pub fn long_running() -> Self {
        Self::with_tail("exec sleep 30")
    }

    /// Encoder that exits with `code` after a short delay.
    pub fn exiting(code: i32) -> Self {
        Self::with_tail(&format!("sleep 0.3\nexit {code}"))
    }

    fn with_tail(tail: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake-ffmpeg");
        let args_file = dir.path().join("args");
        let pid_file = dir.path().join("pid");
        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"-version\" ]; then echo 'fake-ffmpeg version 0.0.1'; exit 0; fi\n\
             echo $$ > '{}'\n\
             echo \"$@\" > '{}'\n\
             {tail}\n",
            pid_file.display(),
            args_file.display()
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self {
            _dir: dir,
            path,
            args_file,
            pid_file,
        }
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap()
    }

    /// Arguments of the last invocation, once the script has written them.
    pub async fn recorded_args(&self) -> String {
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        loop {
            if let Ok(args) = std::fs::read_to_string(&self.args_file) {
                if !args.is_empty() {
                    return args.trim_end().to_string();
                }
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "encoder never recorded its arguments"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Process id of the last invocation. Only valid after
    /// [`FakeEncoder::recorded_args`] returned.
    pub fn recorded_pid(&self) -> u32 {
        std::fs::read_to_string(&self.pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }

    /// Wait until the process `pid` is gone.
    pub async fn wait_for_exit(pid: u32) {
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while is_alive(pid) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "encoder {pid} still running"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    pub fn was_invoked(&self) -> bool {
        self.args_file.exists()
    }
}

fn is_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Sink whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingSink;

impl ObjectSink for FailingSink {
    fn put_object(&self, key: &str, _value: &[u8]) -> Result<()> {
        Err(Error::sink(key, "sink unavailable"))
    }

    fn remove_object(&self, key: &str) -> Result<()> {
        Err(Error::sink(key, "sink unavailable"))
    }
}

/// `simple` driver configuration running `binary` through the ffmpeg
/// framework.
pub fn simple_config(binary: &Path) -> ConfigNode {
    let mut node = ConfigNode::from_toml_str(
        r#"
        name = "simple"

        [inputs.0]
        file = "/dev/video0"

        [outputs.0]
        file_prefix = "rtmp://r/app"

        [framework]
        name = "ffmpeg"

        [framework.inputs.0]
        format = "v4l2"

        [framework.video.codec]
        name = "h264"

        [framework.outputs.0]
        format = "flv"
        "#,
    )
    .unwrap();
    node.overlay("framework.binary", binary.to_string_lossy().as_ref());
    node
}

pub fn driver_args(sink: Arc<dyn ObjectSink>) -> DriverArgs {
    DriverArgs {
        camera: "test-cam".into(),
        sink,
        frameworks: Arc::new(FrameworkRegistry::builtin()),
    }
}

/// Wait until `driver` reports `state`.
pub async fn wait_for_state(driver: &dyn CameraDriver, state: DriverState) {
    wait_for_state_rx(driver.subscribe(), state).await;
}

/// Wait until `rx` carries `state`.
pub async fn wait_for_state_rx(mut rx: watch::Receiver<DriverState>, state: DriverState) {
    tokio::time::timeout(TIMEOUT, rx.wait_for(|s| *s == state))
        .await
        .expect("timed out waiting for driver state")
        .expect("state channel closed");
}

/// Number of `Remove` operations recorded for `key`.
pub fn removals(sink: &MemorySink, key: &str) -> usize {
    sink.history()
        .iter()
        .filter(|op| matches!(op, SinkOp::Remove { key: k } if k == key))
        .count()
}
