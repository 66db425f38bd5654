//! Error types for the host service abstraction layer.

use thiserror::Error;

/// Errors raised at the host management service boundary.
#[derive(Error, Debug)]
pub enum HostError {
    /// Failed to invoke the management shell.
    #[error("Failed to invoke management shell: {0}")]
    Invocation(String),

    /// The management shell exited with a failure status.
    #[error("Management shell exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    /// The service returned output that could not be parsed.
    #[error("Failed to parse management service output: {0}")]
    MalformedOutput(String),

    /// The service reported an asynchronous job but returned no reference.
    #[error("Management service reported a job but returned no job reference")]
    MissingJobReference,

    /// No job exists for the given reference.
    #[error("Unknown job reference: {0}")]
    JobNotFound(String),

    /// No import settings are available for the given path.
    #[error("No import settings available for: {0}")]
    SettingsNotFound(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for host service operations.
pub type Result<T> = std::result::Result<T, HostError>;
