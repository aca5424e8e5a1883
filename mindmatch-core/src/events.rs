//! Notifications emitted by a [`crate::GameSession`].
//!
//! The session queues these as its state changes; the presentation layer
//! drains them with [`crate::GameSession::drain_events`] and re-renders.

use serde::{Deserialize, Serialize};

use crate::types::{GameOverCause, SessionPhase, Tile};

/// A change in observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The lifecycle phase changed.
    PhaseChanged {
        /// Phase left.
        from: SessionPhase,
        /// Phase entered.
        to: SessionPhase,
    },
    /// A tile was lit or every tile went dark (`None`).
    ActiveTileChanged(Option<Tile>),
    /// The running score changed.
    ScoreChanged(u32),
    /// The level (target sequence length) changed.
    LevelChanged(u32),
    /// The game ended.
    GameOver {
        /// Score at the moment the game ended.
        final_score: u32,
        /// High score after this game was recorded.
        high_score: u32,
        /// Whether this game set a new high score.
        new_high_score: bool,
        /// Why the game ended.
        cause: GameOverCause,
    },
}

impl SessionEvent {
    /// Short name used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PhaseChanged { .. } => "phase_changed",
            Self::ActiveTileChanged(_) => "active_tile_changed",
            Self::ScoreChanged(_) => "score_changed",
            Self::LevelChanged(_) => "level_changed",
            Self::GameOver { .. } => "game_over",
        }
    }
}
