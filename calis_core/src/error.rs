//! Error types for the calis_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for calis_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected input (bad recommendation request, empty routine, bad step)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation not allowed in the engine's current state
    #[error("State error: {0}")]
    State(String),

    /// Credential check failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Record store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Audio cue playback failure
    #[error("Cue error: {0}")]
    Cue(String),
}
