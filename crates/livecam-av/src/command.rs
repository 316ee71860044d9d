//! Executable command lines for the encoder process.

use std::fmt;
use std::process::Stdio;

use tokio::process::Command;

/// Shell used to run rendered template command lines.
pub const SHELL: &str = "/bin/sh";

/// A fully resolved program invocation.
///
/// Direct assembly produces an argv vector; template rendering produces a
/// single string that is run through [`SHELL`] with `-c`.
///
/// # Example
///
/// ```
/// use livecam_av::CommandLine;
///
/// let mut cmd = CommandLine::new("ffmpeg");
/// cmd.arg("-y").args(["-f", "v4l2", "-i", "/dev/video0"]);
/// assert_eq!(cmd.to_string(), "ffmpeg -y -f v4l2 -i /dev/video0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Create a new command line for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// A command line that runs `script` with `/bin/sh -c`.
    pub fn shell(script: impl Into<String>) -> Self {
        let mut cmd = Self::new(SHELL);
        cmd.arg("-c").arg(script);
        cmd
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Program to execute.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, excluding the program.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Build a Tokio command for this invocation.
    ///
    /// Stdin is closed so encoders never block waiting for console input, and
    /// the child is killed if its handle is dropped.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}
