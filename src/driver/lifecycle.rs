//! ON/OFF state machine shared by the built-in drivers.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use livecam_av::{ExitOutcome, Waiter};
use livecam_core::{DriverState, Error, Result};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{ENDPOINT_KEY, STATE_KEY};
use crate::framework::Framework;
use crate::sink::ObjectSink;

/// Stream metadata published for one camera.
///
/// Both steps touch two keys without any transaction. Each key is attempted
/// and logged on its own, and a failure never rolls back the other.
pub struct Publication<'a> {
    camera: &'a str,
    sink: &'a dyn ObjectSink,
}

impl<'a> Publication<'a> {
    pub fn new(camera: &'a str, sink: &'a dyn ObjectSink) -> Self {
        Self { camera, sink }
    }

    /// Publish `endpoint` and `state = "on"`.
    pub fn announce(&self, endpoint: &str) {
        let objects = BTreeMap::from([
            (ENDPOINT_KEY.to_string(), endpoint.as_bytes().to_vec()),
            (
                STATE_KEY.to_string(),
                DriverState::On.as_str().as_bytes().to_vec(),
            ),
        ]);
        if let Err(e) = self.sink.put_objects(&objects) {
            error!(camera = %self.camera, endpoint = %endpoint, error = %e, "failed to publish stream");
        }
    }

    /// Remove the endpoint and publish `state = "off"`.
    pub fn retract(&self) {
        if let Err(e) = self.sink.remove_object(ENDPOINT_KEY) {
            error!(camera = %self.camera, error = %e, "failed to remove endpoint");
        }
        if let Err(e) = self
            .sink
            .put_object(STATE_KEY, DriverState::Off.as_str().as_bytes())
        {
            error!(camera = %self.camera, error = %e, "failed to publish state");
        }
    }
}

struct Session {
    state: DriverState,
    generation: u64,
    framework: Option<Arc<dyn Framework>>,
}

/// Driver state plus the framework of the current run.
pub(crate) struct Lifecycle {
    camera: String,
    sink: Arc<dyn ObjectSink>,
    session: Mutex<Session>,
    state_tx: watch::Sender<DriverState>,
}

impl Lifecycle {
    /// Create an OFF lifecycle and publish the OFF state.
    pub(crate) fn new(camera: impl Into<String>, sink: Arc<dyn ObjectSink>) -> Arc<Self> {
        let (state_tx, _) = watch::channel(DriverState::Off);
        let lifecycle = Self {
            camera: camera.into(),
            sink,
            session: Mutex::new(Session {
                state: DriverState::Off,
                generation: 0,
                framework: None,
            }),
            state_tx,
        };
        lifecycle.publication().retract();
        Arc::new(lifecycle)
    }

    pub(crate) fn camera(&self) -> &str {
        &self.camera
    }

    pub(crate) fn state(&self) -> DriverState {
        self.session.lock().state
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<DriverState> {
        self.state_tx.subscribe()
    }

    fn publication(&self) -> Publication<'_> {
        Publication::new(&self.camera, self.sink.as_ref())
    }

    /// Turn the camera on.
    ///
    /// `launch` builds the framework and the endpoint it streams to. It only
    /// runs when the camera is OFF, and nothing is published unless the
    /// framework started.
    pub(crate) fn start<F>(self: &Arc<Self>, launch: F) -> Result<()>
    where
        F: FnOnce() -> Result<(Box<dyn Framework>, String)>,
    {
        let mut session = self.session.lock();
        if session.state == DriverState::On {
            debug!(camera = %self.camera, "camera not startable: already on");
            return Err(Error::NotStartable);
        }

        let (framework, endpoint) = launch()?;
        let framework: Arc<dyn Framework> = Arc::from(framework);
        framework.start()?;
        let waiter = framework.wait();

        session.generation += 1;
        let generation = session.generation;
        session.state = DriverState::On;
        session.framework = Some(framework);
        self.publication().announce(&endpoint);
        self.state_tx.send_replace(DriverState::On);
        drop(session);

        tokio::spawn(Self::watch(Arc::downgrade(self), generation, waiter));
        info!(camera = %self.camera, endpoint = %endpoint, "camera on");
        Ok(())
    }

    /// Turn the camera off. Stopping the framework is best-effort.
    pub(crate) fn stop(&self) -> Result<()> {
        let mut session = self.session.lock();
        if session.state == DriverState::Off {
            debug!(camera = %self.camera, "camera not stoppable: already off");
            return Err(Error::NotStoppable);
        }

        if let Some(framework) = session.framework.take() {
            if let Err(e) = framework.stop() {
                warn!(camera = %self.camera, error = %e, "failed to stop framework");
            }
        }
        self.reset(&mut session);
        info!(camera = %self.camera, "camera off");
        Ok(())
    }

    async fn watch(this: Weak<Self>, generation: u64, waiter: Waiter) {
        let outcome = waiter.wait().await;
        if let Some(lifecycle) = this.upgrade() {
            lifecycle.finish(generation, outcome);
        }
    }

    fn finish(&self, generation: u64, outcome: ExitOutcome) {
        let mut session = self.session.lock();
        if session.state == DriverState::Off || session.generation != generation {
            debug!(camera = %self.camera, "run already reset");
            return;
        }

        match outcome {
            ExitOutcome::Failed(ref msg) => {
                error!(camera = %self.camera, error = %msg, "framework exited with error")
            }
            _ => info!(camera = %self.camera, "framework exited"),
        }
        self.reset(&mut session);
    }

    fn reset(&self, session: &mut Session) {
        self.publication().retract();
        session.state = DriverState::Off;
        session.framework = None;
        self.state_tx.send_replace(DriverState::Off);
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        let session = self.session.get_mut();
        if session.state == DriverState::Off {
            return;
        }
        session.state = DriverState::Off;
        if let Some(framework) = session.framework.take() {
            if let Err(e) = framework.stop() {
                warn!(camera = %self.camera, error = %e, "failed to stop framework");
            }
        }
        self.publication().retract();
        self.state_tx.send_replace(DriverState::Off);
        info!(camera = %self.camera, "camera dropped while on; stream retracted");
    }
}
