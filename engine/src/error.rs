//! Error types for the engine session

use std::time::Duration;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine process is already running")]
    AlreadyRunning,

    #[error("Failed to spawn engine: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Engine process is not running")]
    NotRunning,

    #[error("Engine session is not initialized")]
    NotInitialized,

    #[error("Engine session is already initialized")]
    AlreadyInitialized,

    #[error("Engine session has been stopped")]
    SessionClosed,

    #[error("Engine did not identify itself during the handshake")]
    MissingEngineIdentity,

    #[error("Timed out after {0:?} waiting for uciok")]
    HandshakeTimeout(Duration),

    #[error("Timed out after {0:?} waiting for engine response")]
    RequestTimeout(Duration),

    #[error("Another request is already waiting on the engine")]
    RequestInFlight,

    #[error("Engine output closed before a response arrived")]
    ProcessExited,

    #[error("Malformed move text: {0:?}")]
    MalformedMoveText(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
