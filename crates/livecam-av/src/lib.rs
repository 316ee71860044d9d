//! # livecam-av
//!
//! Encoder command construction and process supervision for livecam.
//!
//! This crate provides:
//!
//! - **Command lines** ([`CommandLine`]) -- argv builder, plus `/bin/sh -c`
//!   wrapping for rendered templates.
//! - **Templates** ([`TemplateContext`]) -- `{{name}}` placeholder rendering.
//! - **ffmpeg strategies** ([`ffmpeg`]) -- direct argv assembly from
//!   structured blocks, and single-input template rendering.
//! - **Endpoints** ([`endpoint`]) -- unique streaming URLs built from a
//!   configured prefix.
//! - **Supervision** ([`ProcessSupervisor`]) -- start/stop of one child with
//!   broadcast exit notification.
//! - **Tool discovery** ([`tools`]) -- locate encoder binaries and read their
//!   version banner.

pub mod command;
pub mod endpoint;
pub mod ffmpeg;
pub mod supervisor;
pub mod template;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::CommandLine;
pub use ffmpeg::{FfmpegFrameworkConfig, FfmpegSimpleConfig, RenderedCommand, RenderedTemplate};
pub use supervisor::{ExitOutcome, ProcessSupervisor, Waiter};
pub use template::TemplateContext;
pub use tools::ToolInfo;
