//! Direct argv assembly from structured blocks.
//!
//! ```toml
//! name = "ffmpeg"
//! binary = "ffmpeg"            # optional
//!
//! [inputs.0]
//! format = "v4l2"
//! file = "/dev/video0"         # usually injected by the driver
//! frame_size = "640x480"       # optional
//! frame_rate = "30"            # optional
//!
//! [video.codec]
//! name = "h264_omx"
//! bit_rate = "2000k"           # optional
//! extra = ["-g", "60"]         # optional
//!
//! [audio.codec]                # whole block optional; absent means -an
//! name = "aac"
//!
//! [outputs.0]
//! format = "flv"
//! file = "rtmp://server/live/key"   # or file_prefix = "rtmp://server/live"
//! ```

use livecam_core::{ConfigNode, Error, Result};

use super::{optional, path, required, required_block, DEFAULT_BINARY};
use crate::command::CommandLine;
use crate::endpoint;

/// One `-f <format> -i <file>` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    /// Block key (`0`, `1`, ...).
    pub key: String,
    pub format: String,
    pub file: String,
    pub frame_size: Option<String>,
    pub frame_rate: Option<String>,
}

/// Video encoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCodec {
    pub name: String,
    pub bit_rate: Option<String>,
    pub extra: Vec<String>,
}

/// Audio encoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCodec {
    pub name: String,
    pub extra: Vec<String>,
}

/// Where an output writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// A fixed file or URL.
    File(String),
    /// A prefix that gets a fresh random suffix on every render.
    Prefix(String),
}

/// One `-f <format> <target>` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    /// Block key (`0`, `1`, ...).
    pub key: String,
    pub format: String,
    pub target: OutputTarget,
}

/// Validated configuration for the `ffmpeg` framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegFrameworkConfig {
    pub binary: String,
    pub inputs: Vec<InputSpec>,
    pub video: VideoCodec,
    pub audio: Option<AudioCodec>,
    pub outputs: Vec<OutputSpec>,
}

/// A command ready to spawn together with the endpoints it writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    pub command: CommandLine,
    /// Resolved output targets, in output order.
    pub endpoints: Vec<String>,
}

impl FfmpegFrameworkConfig {
    /// Validate `node` and capture it as typed configuration.
    ///
    /// Fields are checked in command-line order and the first missing
    /// required field is reported.
    pub fn from_node(node: &ConfigNode) -> Result<Self> {
        let binary = node.get_str_or("binary", DEFAULT_BINARY);

        let inputs_node = required_block(node, "", "inputs")?;
        let mut inputs = Vec::new();
        for key in inputs_node.next_keys() {
            let parent = path("inputs", &key);
            let input = required_block(&inputs_node, "inputs", &key)?;
            inputs.push(InputSpec {
                format: required(&input, &parent, "format")?,
                file: required(&input, &parent, "file")?,
                frame_size: optional(&input, "frame_size"),
                frame_rate: optional(&input, "frame_rate"),
                key,
            });
        }
        if inputs.is_empty() {
            return Err(Error::invalid("inputs", "no input blocks"));
        }

        let video_node = required_block(node, "", "video")?;
        let codec = required_block(&video_node, "video", "codec")?;
        let video = VideoCodec {
            name: required(&codec, "video.codec", "name")?,
            bit_rate: optional(&codec, "bit_rate"),
            extra: codec.get_list("extra"),
        };

        let audio = match node.sub("audio") {
            None => None,
            Some(audio_node) => {
                let codec = required_block(&audio_node, "audio", "codec")?;
                Some(AudioCodec {
                    name: required(&codec, "audio.codec", "name")?,
                    extra: codec.get_list("extra"),
                })
            }
        };

        let outputs_node = required_block(node, "", "outputs")?;
        let mut outputs = Vec::new();
        for key in outputs_node.next_keys() {
            let parent = path("outputs", &key);
            let output = required_block(&outputs_node, "outputs", &key)?;
            let format = required(&output, &parent, "format")?;
            let target = match (optional(&output, "file"), optional(&output, "file_prefix")) {
                (Some(file), _) => OutputTarget::File(file),
                (None, Some(prefix)) => {
                    endpoint::join_endpoint(&prefix, "probe").map_err(|e| {
                        Error::invalid(path(&parent, "file_prefix"), e.to_string())
                    })?;
                    OutputTarget::Prefix(prefix)
                }
                (None, None) => return Err(Error::config(path(&parent, "file"))),
            };
            outputs.push(OutputSpec {
                key,
                format,
                target,
            });
        }
        if outputs.is_empty() {
            return Err(Error::invalid("outputs", "no output blocks"));
        }

        Ok(Self {
            binary,
            inputs,
            video,
            audio,
            outputs,
        })
    }

    /// Assemble the argv for one run.
    ///
    /// Prefix outputs receive a fresh unique suffix on every call.
    pub fn command_line(&self) -> Result<RenderedCommand> {
        let mut cmd = CommandLine::new(&self.binary);
        cmd.arg("-y");

        for input in &self.inputs {
            cmd.arg("-f").arg(&input.format);
            cmd.arg("-i").arg(&input.file);
            if let Some(ref size) = input.frame_size {
                cmd.arg("-s").arg(size);
            }
            if let Some(ref rate) = input.frame_rate {
                cmd.arg("-r").arg(rate);
            }
        }

        cmd.arg("-c:v").arg(&self.video.name);
        if let Some(ref rate) = self.video.bit_rate {
            cmd.arg("-b:v").arg(rate);
        }
        cmd.args(&self.video.extra);

        match self.audio {
            Some(ref audio) => {
                cmd.arg("-c:a").arg(&audio.name);
                cmd.args(&audio.extra);
            }
            None => {
                cmd.arg("-an");
            }
        }

        let mut endpoints = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            let target = match output.target {
                OutputTarget::File(ref file) => file.clone(),
                OutputTarget::Prefix(ref prefix) => endpoint::unique_endpoint(prefix)
                    .map_err(|e| {
                        Error::invalid(format!("outputs.{}.file_prefix", output.key), e.to_string())
                    })?,
            };
            cmd.arg("-f").arg(&output.format);
            cmd.arg(&target);
            endpoints.push(target);
        }

        Ok(RenderedCommand {
            command: cmd,
            endpoints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn base() -> ConfigNode {
        ConfigNode::from_toml_str(
            r#"
            name = "ffmpeg"

            [inputs.0]
            format = "v4l2"
            file = "/dev/video0"
            frame_size = "640x480"
            frame_rate = 30

            [video.codec]
            name = "h264_omx"
            bit_rate = "2000k"
            extra = ["-g", "60"]

            [outputs.0]
            format = "flv"
            file = "rtmp://r/app/key"
            "#,
        )
        .unwrap()
    }

    fn args(cfg: &FfmpegFrameworkConfig) -> Vec<String> {
        cfg.command_line().unwrap().command.get_args().to_vec()
    }

    #[test]
    fn assembles_in_fixed_order() {
        let cfg = FfmpegFrameworkConfig::from_node(&base()).unwrap();
        assert_eq!(cfg.binary, "ffmpeg");
        assert_eq!(
            args(&cfg),
            [
                "-y", "-f", "v4l2", "-i", "/dev/video0", "-s", "640x480", "-r", "30", "-c:v",
                "h264_omx", "-b:v", "2000k", "-g", "60", "-an", "-f", "flv", "rtmp://r/app/key",
            ]
        );
    }

    #[test]
    fn optional_fields_are_omitted() {
        let node = ConfigNode::from_pairs([
            ("binary", "/opt/ffmpeg/bin/ffmpeg"),
            ("inputs.0.format", "v4l2"),
            ("inputs.0.file", "/dev/video0"),
            ("video.codec.name", "h264"),
            ("outputs.0.format", "flv"),
            ("outputs.0.file", "out.flv"),
        ]);
        let cfg = FfmpegFrameworkConfig::from_node(&node).unwrap();
        let rendered = cfg.command_line().unwrap();
        assert_eq!(rendered.command.program(), "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(
            rendered.command.get_args(),
            ["-y", "-f", "v4l2", "-i", "/dev/video0", "-c:v", "h264", "-an", "-f", "flv", "out.flv"]
        );
        assert_eq!(rendered.endpoints, ["out.flv"]);
    }

    #[test]
    fn audio_block_adds_codec() {
        let mut node = base();
        node.overlay("audio.codec.name", "aac");
        node.overlay("audio.codec.extra", "-ar 44100");
        let cfg = FfmpegFrameworkConfig::from_node(&node).unwrap();
        let args = args(&cfg);
        assert!(!args.contains(&"-an".to_string()));
        let pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(&args[pos..pos + 4], ["-c:a", "aac", "-ar", "44100"]);
    }

    #[test]
    fn multiple_inputs_and_outputs_keep_index_order() {
        let mut node = base();
        node.overlay("inputs.1.format", "alsa");
        node.overlay("inputs.1.file", "hw:0");
        node.overlay("outputs.1.format", "mpegts");
        node.overlay("outputs.1.file", "udp://239.0.0.1:1234");
        let cfg = FfmpegFrameworkConfig::from_node(&node).unwrap();
        let line = cfg.command_line().unwrap().command.to_string();
        assert!(line.find("/dev/video0").unwrap() < line.find("hw:0").unwrap());
        assert!(line.ends_with("-f flv rtmp://r/app/key -f mpegts udp://239.0.0.1:1234"));
    }

    #[test]
    fn missing_required_fields_name_exact_path() {
        let cases = [
            ("inputs", "inputs"),
            ("inputs.0.format", "inputs.0.format"),
            ("inputs.0.file", "inputs.0.file"),
            ("video", "video"),
            ("video.codec", "video.codec"),
            ("video.codec.name", "video.codec.name"),
            ("outputs", "outputs"),
            ("outputs.0.format", "outputs.0.format"),
            ("outputs.0.file", "outputs.0.file"),
        ];
        for (remove, expected) in cases {
            let mut node = base();
            node.overlay(remove, serde_json::Value::Null);
            let err = FfmpegFrameworkConfig::from_node(&node).unwrap_err();
            assert_eq!(err.config_path(), Some(expected), "removing {remove}");
        }
    }

    #[test]
    fn audio_without_codec_name_is_rejected() {
        let mut node = base();
        node.overlay("audio.codec.extra", "-ar 44100");
        let err = FfmpegFrameworkConfig::from_node(&node).unwrap_err();
        assert_eq!(err.config_path(), Some("audio.codec.name"));

        let mut node = base();
        node.overlay("audio.enabled", true);
        let err = FfmpegFrameworkConfig::from_node(&node).unwrap_err();
        assert_eq!(err.config_path(), Some("audio.codec"));
    }

    #[test]
    fn empty_input_block_is_rejected() {
        let mut node = base();
        node.overlay("inputs", serde_json::json!({}));
        let err = FfmpegFrameworkConfig::from_node(&node).unwrap_err();
        assert_matches!(err, Error::Config { ref path, detail: Some(_) } if path == "inputs");
    }

    #[test]
    fn prefix_outputs_get_fresh_suffixes() {
        let mut node = base();
        node.overlay("outputs.0", serde_json::json!({ "format": "flv", "file_prefix": "rtmp://r/app" }));
        let cfg = FfmpegFrameworkConfig::from_node(&node).unwrap();
        assert_matches!(cfg.outputs[0].target, OutputTarget::Prefix(_));

        let a = cfg.command_line().unwrap().endpoints.remove(0);
        let b = cfg.command_line().unwrap().endpoints.remove(0);
        assert_ne!(a, b);
        assert!(a.starts_with("rtmp://r/app/"));
        assert_eq!(a.len(), "rtmp://r/app/".len() + endpoint::SUFFIX_LEN);
    }

    #[test]
    fn bad_prefix_is_rejected_up_front() {
        let mut node = base();
        node.overlay("outputs.0", serde_json::json!({ "format": "flv", "file_prefix": "rtmp://[x/app" }));
        let err = FfmpegFrameworkConfig::from_node(&node).unwrap_err();
        assert_eq!(err.config_path(), Some("outputs.0.file_prefix"));
    }
}
