//! Host-facing camera service.
//!
//! [`CameraService`] wraps the driver configured under `[driver]` and is what a
//! transport (the CLI here) calls into. Every start/stop is logged with its
//! outcome before the result is handed back.

use std::sync::Arc;

use livecam_core::{ConfigNode, DriverState, Error, Result};
use tokio::sync::watch;
use tracing::{error, info};

use crate::driver::{CameraDriver, DriverArgs, DriverRegistry, LaunchPlan};
use crate::framework::FrameworkRegistry;
use crate::sink::ObjectSink;

/// Camera label used when the configuration does not name one.
pub const DEFAULT_CAMERA: &str = "camera";

/// Driver and framework registries shared by every camera of a host.
#[derive(Debug, Clone)]
pub struct Registries {
    pub drivers: Arc<DriverRegistry>,
    pub frameworks: Arc<FrameworkRegistry>,
}

impl Registries {
    /// The built-in drivers and frameworks.
    pub fn builtin() -> Self {
        Self {
            drivers: Arc::new(DriverRegistry::builtin()),
            frameworks: Arc::new(FrameworkRegistry::builtin()),
        }
    }
}

pub struct CameraService {
    camera: String,
    driver: Box<dyn CameraDriver>,
}

impl CameraService {
    /// Build the service for the camera described by `root`.
    ///
    /// `root.name` labels the camera; `root.driver.name` picks the driver,
    /// which receives the whole `driver` block.
    pub fn from_config(
        root: &ConfigNode,
        sink: Arc<dyn ObjectSink>,
        registries: &Registries,
    ) -> Result<Self> {
        let camera = root.get_str_or("name", DEFAULT_CAMERA);
        let driver_node = root.sub("driver").ok_or_else(|| Error::config("driver"))?;
        let name = driver_node.get_str("name");
        if name.is_empty() {
            return Err(Error::config("driver.name"));
        }

        let args = DriverArgs {
            camera: camera.clone(),
            sink,
            frameworks: Arc::clone(&registries.frameworks),
        };
        let driver = registries.drivers.resolve(&name, driver_node, &args)?;
        info!(camera = %camera, driver = %name, "camera service ready");
        Ok(Self { camera, driver })
    }

    pub fn camera(&self) -> &str {
        &self.camera
    }

    pub fn start(&self) -> Result<()> {
        match self.driver.start() {
            Ok(()) => {
                info!(camera = %self.camera, "start");
                Ok(())
            }
            Err(e) => {
                error!(camera = %self.camera, kind = e.kind(), error = %e, "start");
                Err(e)
            }
        }
    }

    pub fn stop(&self) -> Result<()> {
        match self.driver.stop() {
            Ok(()) => {
                info!(camera = %self.camera, "stop");
                Ok(())
            }
            Err(e) => {
                error!(camera = %self.camera, kind = e.kind(), error = %e, "stop");
                Err(e)
            }
        }
    }

    pub fn state(&self) -> DriverState {
        self.driver.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<DriverState> {
        self.driver.subscribe()
    }

    /// What `start` would run.
    pub fn render(&self) -> Result<LaunchPlan> {
        self.driver.render()
    }
}
