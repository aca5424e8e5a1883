//! Runtime error types.

use thiserror::Error;

/// Errors returned by the session driver.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The driver task has stopped and no longer accepts commands.
    #[error("session driver is not running")]
    Closed,

    /// The driver task panicked or was cancelled.
    #[error("session driver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Setting up the session failed.
    #[error("session setup failed: {0}")]
    Core(#[from] mindmatch_core::MindMatchError),
}

/// Convenience alias for runtime results.
pub type Result<T> = std::result::Result<T, RuntimeError>;
