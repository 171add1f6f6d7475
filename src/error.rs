//! Client error types.

use thiserror::Error;

/// Errors that can occur while configuring the client or talking to the API.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value, detected at construction
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No API key was provided
    #[error("missing API key")]
    MissingApiKey,

    /// A batch or query could not be serialized to JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network error during an HTTP exchange
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("server error: HTTP {status}: {message}")]
    Server {
        status: u16,
        message: String,
    },
}
