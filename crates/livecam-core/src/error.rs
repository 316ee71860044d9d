//! Unified error type for the livecam workspace.
//!
//! Every crate funnels its failures into [`Error`]. The host layer uses
//! [`Error::kind`] to report a stable category alongside the message.

/// Unified error type covering all failure modes of drivers and frameworks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration field is missing or malformed.
    ///
    /// `path` is the exact dotted path relative to the node the component was
    /// handed (e.g. `inputs.0.format`).
    #[error(
        "invalid config: {path}{}",
        .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
    )]
    Config {
        /// Dotted path of the offending field.
        path: String,
        /// Optional detail about why the value was rejected.
        detail: Option<String>,
    },

    /// A whole configuration document could not be parsed or deserialized.
    #[error("failed to parse {format}: {message}")]
    Parse {
        /// Document format or target ("toml", "json", "settings").
        format: &'static str,
        /// Parser message, including line and column when the parser reports them.
        message: String,
    },

    /// A registry lookup found no constructor under the requested name.
    #[error("unknown {registry}: {name:?}")]
    UnknownName {
        /// Which registry was consulted ("camera driver", "framework").
        registry: &'static str,
        /// The name that was looked up.
        name: String,
    },

    /// `start` was called while already running.
    #[error("not startable")]
    NotStartable,

    /// `stop` was called while not running.
    #[error("not stoppable")]
    NotStoppable,

    /// The external process could not be spawned.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that was being launched.
        program: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// Waiting on the external process failed, or it exited unsuccessfully.
    #[error("process error: {0}")]
    Process(String),

    /// Publishing to or retracting from the object sink failed.
    #[error("sink error [{key}]: {message}")]
    Sink {
        /// Sink key being written or removed.
        key: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Stable category name for this error, used by the host when reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config { .. } | Error::Parse { .. } => "config",
            Error::UnknownName { .. } => "unknown_name",
            Error::NotStartable | Error::NotStoppable => "state",
            Error::Spawn { .. } | Error::Process(_) => "process",
            Error::Sink { .. } => "sink",
            Error::Io { .. } => "io",
        }
    }

    /// Convenience constructor for a missing required field.
    pub fn config(path: impl Into<String>) -> Self {
        Error::Config {
            path: path.into(),
            detail: None,
        }
    }

    /// Convenience constructor for a present but unusable field.
    pub fn invalid(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Config {
            path: path.into(),
            detail: Some(detail.into()),
        }
    }

    /// Convenience constructor for [`Error::Parse`].
    pub fn parse(format: &'static str, message: impl ToString) -> Self {
        Error::Parse {
            format,
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::UnknownName`].
    pub fn unknown(registry: &'static str, name: impl Into<String>) -> Self {
        Error::UnknownName {
            registry,
            name: name.into(),
        }
    }

    /// Convenience constructor for [`Error::Spawn`].
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Error::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Convenience constructor for [`Error::Sink`].
    pub fn sink(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Sink {
            key: key.into(),
            message: message.into(),
        }
    }

    /// The dotted config path carried by a [`Error::Config`], if any.
    pub fn config_path(&self) -> Option<&str> {
        match self {
            Error::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
