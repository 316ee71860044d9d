//! Supervision of a single external process.
//!
//! A [`ProcessSupervisor`] owns at most one child at a time. `start` spawns it
//! and returns immediately; a background task waits for the exit and
//! broadcasts the [`ExitOutcome`] to every [`Waiter`]. `stop` cancels the
//! child and broadcasts [`ExitOutcome::Stopped`] right away.
//!
//! Each run owns a `watch` cell holding its outcome. Waiters read that cell,
//! so a waiter created after the run ended still observes the result.

use std::sync::Arc;

use livecam_core::{Error, Result, SupervisorState};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::CommandLine;

/// How a supervised run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The run was stopped through [`ProcessSupervisor::stop`].
    Stopped,
    /// The process exited by itself with a success status.
    Exited,
    /// The process exited unsuccessfully or could not be waited on.
    Failed(String),
}

impl ExitOutcome {
    /// Whether this outcome carries no error.
    pub fn is_clean(&self) -> bool {
        !matches!(self, ExitOutcome::Failed(_))
    }

    /// Convert into a `Result`, mapping failures to [`Error::Process`].
    pub fn into_result(self) -> Result<()> {
        match self {
            ExitOutcome::Failed(msg) => Err(Error::Process(msg)),
            _ => Ok(()),
        }
    }
}

/// One-shot subscription to the end of a run.
#[derive(Debug, Clone)]
pub struct Waiter {
    rx: watch::Receiver<Option<ExitOutcome>>,
}

impl Waiter {
    /// Wait until the run this waiter is attached to has ended.
    pub async fn wait(mut self) -> ExitOutcome {
        match self.rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(ExitOutcome::Stopped),
            Err(_) => ExitOutcome::Failed("supervisor dropped before the run ended".into()),
        }
    }

    /// The outcome, if the run has already ended.
    pub fn outcome(&self) -> Option<ExitOutcome> {
        self.rx.borrow().clone()
    }
}

#[derive(Debug)]
struct ActiveRun {
    generation: u64,
    pid: Option<u32>,
    cancel: CancellationToken,
    outcome: watch::Sender<Option<ExitOutcome>>,
}

#[derive(Debug)]
struct Inner {
    active: Option<ActiveRun>,
    generation: u64,
    /// Outcome cell of the current run, or of the last one when idle.
    latest: watch::Receiver<Option<ExitOutcome>>,
}

/// Owns a single external process and reports when it ends.
///
/// `start` and `stop` must be called from within a Tokio runtime.
#[derive(Debug)]
pub struct ProcessSupervisor {
    label: String,
    shared: Arc<Mutex<Inner>>,
}

impl ProcessSupervisor {
    /// Create an idle supervisor. `label` is attached to every log event.
    pub fn new(label: impl Into<String>) -> Self {
        // Before the first run, waiters resolve immediately with a clean result.
        let (_, latest) = watch::channel(Some(ExitOutcome::Stopped));
        Self {
            label: label.into(),
            shared: Arc::new(Mutex::new(Inner {
                active: None,
                generation: 0,
                latest,
            })),
        }
    }

    /// Current state.
    pub fn state(&self) -> SupervisorState {
        if self.shared.lock().active.is_some() {
            SupervisorState::Running
        } else {
            SupervisorState::Idle
        }
    }

    /// OS process id of the running child.
    pub fn pid(&self) -> Option<u32> {
        self.shared.lock().active.as_ref().and_then(|run| run.pid)
    }

    /// Spawn `command` and start watching it.
    ///
    /// # Errors
    ///
    /// - [`Error::NotStartable`] if a process is already running.
    /// - [`Error::Spawn`] if the OS refused to start the process.
    pub fn start(&self, command: &CommandLine) -> Result<()> {
        let mut inner = self.shared.lock();
        if inner.active.is_some() {
            debug!(camera = %self.label, "process not startable: already running");
            return Err(Error::NotStartable);
        }

        let mut child = command
            .to_command()
            .spawn()
            .map_err(|e| Error::spawn(command.program(), e))?;
        let pid = child.id();

        inner.generation += 1;
        let generation = inner.generation;
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(None);
        inner.latest = rx;
        inner.active = Some(ActiveRun {
            generation,
            pid,
            cancel: cancel.clone(),
            outcome: tx,
        });
        drop(inner);

        let shared = Arc::clone(&self.shared);
        let label = self.label.clone();
        tokio::spawn(async move {
            let exited = tokio::select! {
                status = child.wait() => Some(status),
                _ = cancel.cancelled() => None,
            };
            let outcome = match exited {
                Some(Ok(status)) if status.success() => ExitOutcome::Exited,
                Some(Ok(status)) => ExitOutcome::Failed(format!("process {status}")),
                Some(Err(e)) => ExitOutcome::Failed(format!("failed to wait for process: {e}")),
                None => {
                    if let Err(e) = child.kill().await {
                        warn!(camera = %label, error = %e, "failed to kill process");
                    }
                    debug!(camera = %label, "process killed after stop");
                    return;
                }
            };

            let mut inner = shared.lock();
            let current = inner
                .active
                .as_ref()
                .map_or(false, |run| run.generation == generation);
            if !current {
                return;
            }

            match outcome {
                ExitOutcome::Failed(ref msg) => {
                    debug!(camera = %label, error = %msg, "failed to wait process exit")
                }
                _ => debug!(camera = %label, "process exited"),
            }
            if let Some(run) = inner.active.take() {
                run.outcome.send_replace(Some(outcome));
            }
        });

        info!(camera = %self.label, pid = ?pid, cmd = %command, "process started");
        Ok(())
    }

    /// Cancel the running process.
    ///
    /// Waiters are notified with [`ExitOutcome::Stopped`] before this returns.
    ///
    /// # Errors
    ///
    /// [`Error::NotStoppable`] if no process is running.
    pub fn stop(&self) -> Result<()> {
        let mut inner = self.shared.lock();
        let Some(run) = inner.active.take() else {
            debug!(camera = %self.label, "process not stoppable: idle");
            return Err(Error::NotStoppable);
        };

        run.cancel.cancel();
        run.outcome.send_replace(Some(ExitOutcome::Stopped));
        info!(camera = %self.label, pid = ?run.pid, "process stopped");
        Ok(())
    }

    /// Subscribe to the end of the current run, or the last one when idle.
    ///
    /// A waiter attaches to exactly one run. Taken while idle, it resolves
    /// immediately with the previous run's outcome ([`ExitOutcome::Stopped`]
    /// before any run) and never observes a later `start`. Call `wait` after
    /// `start` to follow that run.
    pub fn wait(&self) -> Waiter {
        Waiter {
            rx: self.shared.lock().latest.clone(),
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if let Some(run) = self.shared.lock().active.take() {
            run.cancel.cancel();
            run.outcome.send_replace(Some(ExitOutcome::Stopped));
        }
    }
}
