//! # livecam-core
//!
//! Shared building blocks for the livecam workspace:
//!
//! - **Errors** ([`Error`], [`Result`]) -- the taxonomy every driver and
//!   framework reports through.
//! - **Configuration** ([`ConfigNode`]) -- dotted-key access over a TOML/JSON
//!   tree, with `sub`/`next_keys` for walking indexed blocks.
//! - **States** ([`DriverState`], [`SupervisorState`]).

pub mod config;
pub mod error;
pub mod state;

pub use config::ConfigNode;
pub use error::{Error, Result};
pub use state::{DriverState, SupervisorState};
