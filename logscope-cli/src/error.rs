//! CLI-specific error types and exit code mapping

use logscope_core::error::LogscopeError;
use logscope_search::LogSearchError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logscope-core.
    #[error("{0}")]
    Core(#[from] LogscopeError),

    /// Search engine error.
    #[error("search error: {0}")]
    Search(#[from] LogSearchError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                        |
    /// |------|------------------------------------------------|
    /// | 0    | Success (including an empty search result)     |
    /// | 1    | General / command error                        |
    /// | 2    | Configuration error or invalid search request  |
    /// | 10   | IO error (local file, remote stream)           |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(LogscopeError::Config(_)) => 2,
            Self::Search(e) if e.is_configuration() => 2,
            Self::Core(LogscopeError::Search(_)) => 2,
            Self::Search(LogSearchError::Worker(_)) => 1,
            Self::Io(_) | Self::Core(LogscopeError::Io(_)) | Self::Search(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}
