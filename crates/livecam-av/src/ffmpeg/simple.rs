//! Template-rendered single-input ffmpeg invocation.
//!
//! ```toml
//! ffmpeg_file = "ffmpeg"             # optional
//! ffmpeg_template = "..."            # optional, defaults to DEFAULT_TEMPLATE
//!
//! [video_input]
//! format = "v4l2"
//! file = "/dev/video0"
//! frame_size = "640x480"
//! frame_rate = "30"
//!
//! [video_input.codec]
//! name = "h264_omx"
//! bit_rate = "2000k"
//! extra = ["-g", "60"]               # optional
//!
//! [output]
//! format = "flv"
//! file_prefix = "rtmp://server:1935/live"
//! ```

use livecam_core::{ConfigNode, Error, Result};

use super::{optional, required, required_block, DEFAULT_BINARY};
use crate::command::CommandLine;
use crate::endpoint;
use crate::template::TemplateContext;

/// Command template used when `ffmpeg_template` is not configured.
pub const DEFAULT_TEMPLATE: &str = "{{ffmpeg_file}} -y -f {{video_input_format}} -i {{video_input_file}} -s {{video_input_frame_size}} -r {{video_input_frame_rate}} -c:v {{video_input_codec_name}} -b:v {{video_input_codec_bit_rate}} {{video_input_codec_extra}} -f {{output_format}} {{output_file}}";

/// Validated configuration for the template-driven `ffmpeg_simple` driver.
///
/// `frame_size`, `frame_rate` and `codec.bit_rate` are required when the
/// default template is used, since it references them unconditionally. With a
/// custom template they are optional and render empty when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegSimpleConfig {
    pub template: String,
    pub ffmpeg_file: String,
    pub video_input_format: String,
    pub video_input_file: String,
    pub video_input_frame_size: Option<String>,
    pub video_input_frame_rate: Option<String>,
    pub video_input_codec_name: String,
    pub video_input_codec_bit_rate: Option<String>,
    pub video_input_codec_extra: Vec<String>,
    pub output_format: String,
    pub output_file_prefix: String,
}

/// A rendered template ready to spawn, plus the endpoint it streams to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub command: CommandLine,
    pub endpoint: String,
}

impl FfmpegSimpleConfig {
    /// Validate `node` and capture it as typed configuration.
    pub fn from_node(node: &ConfigNode) -> Result<Self> {
        let template = node.get_str_or("ffmpeg_template", DEFAULT_TEMPLATE);
        let strict = template == DEFAULT_TEMPLATE;
        let pick = |n: &ConfigNode, parent: &str, key: &str| -> Result<Option<String>> {
            if strict {
                required(n, parent, key).map(Some)
            } else {
                Ok(optional(n, key))
            }
        };

        let ffmpeg_file = node.get_str_or("ffmpeg_file", DEFAULT_BINARY);

        let input = required_block(node, "", "video_input")?;
        let video_input_format = required(&input, "video_input", "format")?;
        let video_input_file = required(&input, "video_input", "file")?;
        let video_input_frame_size = pick(&input, "video_input", "frame_size")?;
        let video_input_frame_rate = pick(&input, "video_input", "frame_rate")?;

        let codec = required_block(&input, "video_input", "codec")?;
        let video_input_codec_name = required(&codec, "video_input.codec", "name")?;
        let video_input_codec_bit_rate = pick(&codec, "video_input.codec", "bit_rate")?;
        let video_input_codec_extra = codec.get_list("extra");

        let output = required_block(node, "", "output")?;
        let output_format = required(&output, "output", "format")?;
        let output_file_prefix = required(&output, "output", "file_prefix")?;
        endpoint::join_endpoint(&output_file_prefix, "probe")
            .map_err(|e| Error::invalid("output.file_prefix", e.to_string()))?;

        Ok(Self {
            template,
            ffmpeg_file,
            video_input_format,
            video_input_file,
            video_input_frame_size,
            video_input_frame_rate,
            video_input_codec_name,
            video_input_codec_bit_rate,
            video_input_codec_extra,
            output_format,
            output_file_prefix,
        })
    }

    /// Template variables for a run streaming to `output_file`.
    pub fn context(&self, output_file: &str) -> TemplateContext {
        TemplateContext::new()
            .with_var("ffmpeg_file", &self.ffmpeg_file)
            .with_var("video_input_format", &self.video_input_format)
            .with_var("video_input_file", &self.video_input_file)
            .with_var(
                "video_input_frame_size",
                self.video_input_frame_size.clone().unwrap_or_default(),
            )
            .with_var(
                "video_input_frame_rate",
                self.video_input_frame_rate.clone().unwrap_or_default(),
            )
            .with_var("video_input_codec_name", &self.video_input_codec_name)
            .with_var(
                "video_input_codec_bit_rate",
                self.video_input_codec_bit_rate.clone().unwrap_or_default(),
            )
            .with_var(
                "video_input_codec_extra",
                self.video_input_codec_extra.join(" "),
            )
            .with_var("output_format", &self.output_format)
            .with_var("output_file", output_file)
    }

    /// Render the command for one run with a fresh unique endpoint.
    pub fn render(&self) -> Result<RenderedTemplate> {
        let endpoint = endpoint::unique_endpoint(&self.output_file_prefix)
            .map_err(|e| Error::invalid("output.file_prefix", e.to_string()))?;
        let script = self.context(&endpoint).render(&self.template);
        Ok(RenderedTemplate {
            command: CommandLine::shell(script),
            endpoint,
        })
    }
}
