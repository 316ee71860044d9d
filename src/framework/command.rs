use livecam_av::{CommandLine, ProcessSupervisor, Waiter};
use livecam_core::{Result, SupervisorState};

use super::Framework;

/// A framework that runs one pre-rendered command line.
///
/// Used by drivers that build the command themselves, such as the template
/// driver.
#[derive(Debug)]
pub struct CommandFramework {
    command: CommandLine,
    supervisor: ProcessSupervisor,
}

impl CommandFramework {
    pub fn new(camera: &str, command: CommandLine) -> Self {
        Self {
            command,
            supervisor: ProcessSupervisor::new(camera),
        }
    }
}

impl Framework for CommandFramework {
    fn start(&self) -> Result<()> {
        self.supervisor.start(&self.command)
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
        Ok(self.command.clone())
    }
}
