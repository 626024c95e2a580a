//! Error types for the engine.

use thiserror::Error;

/// Errors raised while bringing up audio I/O.
///
/// The command surface on [`Engine`](crate::engine::Engine) never returns
/// these; they surface only from `ensure_initialized` and the device traits.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no output device available")]
    NoOutputDevice,

    #[error("no input device available")]
    NoInputDevice,

    #[error("device configuration error: {0}")]
    DeviceConfig(String),

    #[error("failed to build stream: {0}")]
    BuildStream(String),

    #[error("failed to start stream: {0}")]
    PlayStream(String),

    #[error("microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("audio output is unavailable")]
    Unavailable,

    #[error("control queue is full")]
    QueueFull,
}

pub type Result<T> = std::result::Result<T, EngineError>;
