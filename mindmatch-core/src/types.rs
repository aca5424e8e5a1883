//! Core type definitions for the Mind Match game.
//!
//! Tiles are plain indices into a fixed palette. They are never created or
//! destroyed, only referenced by the sequences that make up a game.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::MindMatchError;

/// Number of selectable tiles on the board.
pub const TILE_COUNT: u8 = 4;

/// Points awarded for every correctly matched tile (not per round).
pub const POINTS_PER_TILE: u32 = 10;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// One of the [`TILE_COUNT`] selectable targets, identified by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tile(u8);

impl Tile {
    /// Every tile on the board, in index order.
    pub const ALL: [Tile; TILE_COUNT as usize] = [Tile(0), Tile(1), Tile(2), Tile(3)];

    /// Checked constructor. Returns `None` for indices outside `0..TILE_COUNT`.
    #[must_use]
    pub fn new(index: u8) -> Option<Self> {
        (index < TILE_COUNT).then_some(Self(index))
    }

    /// The tile's palette index.
    #[must_use]
    pub fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Tile {
    type Error = MindMatchError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index).ok_or(MindMatchError::InvalidTile(index))
    }
}

impl From<Tile> for u8 {
    fn from(tile: Tile) -> Self {
        tile.0
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one played game, from `start_game` to game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// State Machine
// ---------------------------------------------------------------------------

/// Lifecycle phase of a [`crate::GameSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No game running.
    #[default]
    Idle,
    /// The target sequence is being replayed; input is ignored.
    Playback,
    /// Waiting for the player to repeat the sequence.
    AwaitingInput,
    /// The round was matched; the next round starts after the settle delay.
    RoundComplete,
    /// The game ended by a mismatch or by abandoning it.
    GameOver,
}

impl SessionPhase {
    /// Whether a game is in progress (anything but `Idle` and `GameOver`).
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Playback | Self::AwaitingInput | Self::RoundComplete
        )
    }

    /// Whether player clicks are accepted in this phase.
    #[must_use]
    pub fn accepts_input(self) -> bool {
        self == Self::AwaitingInput
    }

    /// Short status line for a presentation layer.
    #[must_use]
    pub fn status_label(self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Playback => "Watch...",
            Self::AwaitingInput => "Your turn!",
            Self::RoundComplete => "Well done!",
            Self::GameOver => "Game over",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of validating one player selection against the target sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Correct tile, more tiles remain this round.
    Continue,
    /// Correct tile and it was the last one of the round.
    RoundComplete,
    /// Wrong tile.
    Mismatch,
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverCause {
    /// The player selected the wrong tile.
    Mismatch {
        /// Tile the target sequence expected at this position.
        expected: Tile,
        /// Tile the player actually selected.
        selected: Tile,
    },
    /// The game was abandoned by the caller.
    Abandoned,
}

/// Why a click was discarded without touching the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoreReason {
    /// The index is not a valid tile.
    InvalidTile(u8),
    /// The session is not collecting input in this phase.
    NotAcceptingInput(SessionPhase),
}

/// Result of [`crate::GameSession::on_tile_clicked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickOutcome {
    /// The click was validated.
    Accepted(Verdict),
    /// The click had no effect.
    Ignored(IgnoreReason),
}

impl ClickOutcome {
    /// The verdict, if the click was validated.
    #[must_use]
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            Self::Accepted(verdict) => Some(verdict),
            Self::Ignored(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Observable State
// ---------------------------------------------------------------------------

/// Everything a presentation layer needs to render the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current game, if one has been started.
    pub session: Option<SessionId>,
    /// Current lifecycle phase.
    pub phase: SessionPhase,
    /// Tile currently lit by a replay pulse or click feedback.
    pub active_tile: Option<Tile>,
    /// Running score.
    pub score: u32,
    /// Current level (length of the target sequence).
    pub level: u32,
    /// Best score ever reached at game over.
    pub high_score: u32,
    /// Number of tiles the player has matched this round.
    pub progress: usize,
}
