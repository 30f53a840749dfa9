//! Error types shared across the studio.
//!
//! Stopping a task is not an error for callers of `ProgressController::run`
//! (it resolves to `Ok(None)`); `TaskError::Stopped` only travels between a
//! cooperating task and the controller.

use thiserror::Error;

/// Failures of the AI client collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// No client configured, or the configured one cannot be reached.
    #[error("AI service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A single request failed.
    #[error("AI request failed: {0}")]
    Request(String),

    /// The response did not have the expected shape.
    #[error("AI response malformed: {0}")]
    Malformed(String),
}

/// Failures surfaced by the progress task controller.
#[derive(Error, Debug)]
pub enum TaskError {
    /// A task is already running or paused on this controller.
    #[error("another task is already in progress")]
    Busy,

    /// The run was stopped by the user.
    #[error("task stopped by user")]
    Stopped,

    /// The task itself failed.
    #[error("task failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Failures of the audio output and decoding path.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("audio output unavailable: {0}")]
    NoOutput(String),

    #[error("audio decode error: {0}")]
    Decode(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while saving or restoring the studio wizard snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot rejected: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("snapshot could not be written: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}
