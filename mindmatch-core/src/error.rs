//! Error types for the Mind Match core library.
//!
//! Game outcomes (a wrong tile, a click during playback) are not errors;
//! they surface as [`crate::Verdict`] and [`crate::events::SessionEvent`]
//! values. Errors here cover configuration, storage and caller misuse.

use thiserror::Error;

/// Top-level error type for all Mind Match operations.
#[derive(Error, Debug)]
pub enum MindMatchError {
    /// A tile index outside `0..TILE_COUNT` was supplied.
    #[error("Invalid tile index: {0} (expected 0..{count})", count = crate::TILE_COUNT)]
    InvalidTile(u8),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MindMatchError>;
