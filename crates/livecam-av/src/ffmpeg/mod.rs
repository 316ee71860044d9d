//! ffmpeg command construction.
//!
//! Two strategies are provided:
//!
//! - [`FfmpegFrameworkConfig`] assembles an argv vector from structured
//!   `inputs` / `video` / `audio` / `outputs` blocks.
//! - [`FfmpegSimpleConfig`] renders a single-input template string.
//!
//! Both validate their [`ConfigNode`] once, at construction, and report the
//! first missing required field by its dotted path.

mod direct;
mod simple;

pub use direct::{
    AudioCodec, FfmpegFrameworkConfig, InputSpec, OutputSpec, OutputTarget, RenderedCommand,
    VideoCodec,
};
pub use simple::{FfmpegSimpleConfig, RenderedTemplate, DEFAULT_TEMPLATE};

use livecam_core::{ConfigNode, Error, Result};

/// Binary used when no override is configured.
pub const DEFAULT_BINARY: &str = "ffmpeg";

/// Join a parent path and a key into a dotted path.
fn path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Non-empty scalar at `key`, if any.
fn optional(node: &ConfigNode, key: &str) -> Option<String> {
    let val = node.get_str(key);
    (!val.is_empty()).then_some(val)
}

/// Non-empty scalar at `key`, or a config error naming `parent.key`.
fn required(node: &ConfigNode, parent: &str, key: &str) -> Result<String> {
    optional(node, key).ok_or_else(|| Error::config(path(parent, key)))
}

/// Block at `key`, or a config error naming `parent.key`.
fn required_block(node: &ConfigNode, parent: &str, key: &str) -> Result<ConfigNode> {
    node.sub(key).ok_or_else(|| Error::config(path(parent, key)))
}
