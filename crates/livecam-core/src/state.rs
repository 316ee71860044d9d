//! Lifecycle states shared by drivers and process supervisors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Externally visible state of a camera driver.
///
/// The lowercase rendering (`"on"` / `"off"`) is the literal value published
/// under the `state` sink key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverState {
    /// No stream is running.
    #[default]
    Off,
    /// The encoder process is running and the endpoint is published.
    On,
}

impl DriverState {
    /// The literal published to the sink.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverState::Off => "off",
            DriverState::On => "on",
        }
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a process supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupervisorState {
    /// No process is owned.
    #[default]
    Idle,
    /// Exactly one process is owned and has not been observed to exit.
    Running,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Idle => f.write_str("idle"),
            SupervisorState::Running => f.write_str("running"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_state_literals() {
        assert_eq!(DriverState::On.to_string(), "on");
        assert_eq!(DriverState::Off.as_str(), "off");
        assert_eq!(DriverState::default(), DriverState::Off);
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&DriverState::On).unwrap();
        assert_eq!(json, "\"on\"");
        let back: SupervisorState = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(back, SupervisorState::Running);
    }
}
