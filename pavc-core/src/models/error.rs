use thiserror::Error;

/// Errors that can occur while driving the audio server.
///
/// Every variant is fatal: the session is torn down and the process exits
/// with a nonzero status. There is no retry and no partial-success
/// reporting — a multi-sink command that fails midway aborts as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// An event loop, context, or operation handle could not be created.
    #[error("failed to create {0}")]
    Resource(&'static str),

    /// The connection to the audio server failed or was terminated.
    #[error("connection to audio server {0}")]
    Connection(String),

    /// A pending operation never started, was cancelled, or completed with
    /// a server-reported error.
    #[error("{0}")]
    Operation(String),

    /// Malformed command line.
    #[error("{0}")]
    Usage(String),

    /// The sink registry reached its hard capacity limit.
    #[error("sink registry limit reached")]
    RegistryLimit,
}
