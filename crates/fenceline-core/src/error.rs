//! Error types for the core library.

use thiserror::Error;

/// Errors surfaced by the assistant loop and its configuration.
///
/// None of these reach the user directly: the assistant turns them into
/// transcript messages, and the host only sees them when it asks.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// No model client could be built (missing API key).
    #[error("the assistant is not configured")]
    NotConfigured,
    /// The utterance was empty after trimming.
    #[error("empty utterance")]
    EmptyUtterance,
    /// A model call for this assistant is already in flight.
    #[error("a request is already in progress")]
    TurnInFlight,
    /// The model call failed (network, non-OK status, bad body).
    #[error("model request failed: {0}")]
    Model(#[from] anyhow::Error),
    /// The in-flight model task was cancelled or panicked.
    #[error("model task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// The speech recognizer refused to start.
    #[error("speech recognition could not start: {0}")]
    RecognitionStart(String),
    /// The platform has no config directory.
    #[error("could not determine config directory")]
    NoConfigDir,
    /// I/O error reading or writing config.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result alias for core operations.
pub type Result<T> = std::result::Result<T, AssistantError>;
