//! Error types for podvault-core

use thiserror::Error;

/// Result type alias using podvault-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`], used by callers to decide on
/// retry policy and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Options or inputs rejected before any side effect
    Validation,
    /// Pod or local backup file checks failed before streaming
    PreFlight,
    /// The remote-exec process could not be started
    Spawn,
    /// Local write or remote read failed mid-stream
    Streaming,
    /// The remote process exited unsuccessfully
    CommandExit,
    /// The operation was cancelled by the caller
    Cancelled,
    /// Configuration could not be loaded or is invalid
    Config,
}

/// Core error types for podvault
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or ill-formed options
    #[error("Invalid options: {message}")]
    Validation { message: String },

    /// Backup file name does not carry a supported archive extension
    #[error("Unsupported backup format: {path} (expected .tar, .tar.gz, .tgz, .tar.bz2 or .tar.xz)")]
    UnsupportedFormat { path: String },

    /// Backup metadata was recorded by a different provider
    #[error("Backup was created by provider '{actual}', expected '{expected}'")]
    ProviderMismatch { expected: String, actual: String },

    /// Target pod does not exist in the namespace
    #[error("Pod not found: {namespace}/{pod}")]
    PodNotFound { namespace: String, pod: String },

    /// Local backup file does not exist
    #[error("Backup file not found: {path}")]
    BackupFileNotFound { path: String },

    /// Local backup path exists but is not a regular file
    #[error("Backup path is not a regular file: {path}")]
    NotARegularFile { path: String },

    /// Remote-exec process could not be started
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from the remote process or writing locally failed
    #[error("Streaming failed during {stage}: {source}")]
    Stream {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Remote process exited with a non-zero status
    #[error("Command '{command}' failed with {status}")]
    CommandFailed { command: String, status: String },

    /// Size probe output could not be parsed
    #[error("Failed to parse size from output '{output}'")]
    SizeParse { output: String },

    /// Operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid engine configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Provider name not present in the registry
    #[error("Unknown provider: {name}")]
    UnknownProvider { name: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(path: impl Into<String>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    /// Create a provider mismatch error
    pub fn provider_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ProviderMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a pod not found error
    pub fn pod_not_found(namespace: impl Into<String>, pod: impl Into<String>) -> Self {
        Self::PodNotFound {
            namespace: namespace.into(),
            pod: pod.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Create a streaming error for the given stage
    pub fn stream(stage: &'static str, source: std::io::Error) -> Self {
        Self::Stream { stage, source }
    }

    /// Create a command failure error
    pub fn command_failed(command: impl Into<String>, status: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            status: status.into(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unknown provider error
    pub fn unknown_provider(name: impl Into<String>) -> Self {
        Self::UnknownProvider { name: name.into() }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. }
            | Self::UnsupportedFormat { .. }
            | Self::ProviderMismatch { .. }
            | Self::UnknownProvider { .. } => ErrorKind::Validation,
            Self::PodNotFound { .. }
            | Self::BackupFileNotFound { .. }
            | Self::NotARegularFile { .. } => ErrorKind::PreFlight,
            Self::Spawn { .. } => ErrorKind::Spawn,
            Self::Stream { .. } | Self::Io(_) => ErrorKind::Streaming,
            Self::CommandFailed { .. } | Self::SizeParse { .. } => ErrorKind::CommandExit,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::ConfigNotFound { .. }
            | Self::InvalidConfig { .. }
            | Self::YamlParse(_)
            | Self::JsonParse(_) => ErrorKind::Config,
        }
    }

    /// Whether this error reports a missing pod
    pub fn is_pod_not_found(&self) -> bool {
        matches!(self, Self::PodNotFound { .. })
    }
}
