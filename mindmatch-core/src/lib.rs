//! # Mind Match Core Library
//!
//! Game logic for a "Simon"-style sequence-memory mini-game.
//!
//! The game shows a growing sequence of tiles and the player has to repeat
//! it. The crate is split into small pieces that a [`GameSession`] wires
//! together:
//!
//! - **sequence** — picks the next random [`Tile`] for the target sequence
//! - **timer** — explicit, cancellable virtual-time timers
//! - **playback** — replays a sequence as timed "tile active" pulses
//! - **validator** — checks one player selection against the target
//! - **session** — the game state machine, score and level counters
//! - **score_store** / **persistence** — the persisted high score
//!
//! Nothing here touches a wall clock. The caller advances time explicitly
//! through [`GameSession::advance`], which keeps the state machine fully
//! deterministic under test; `mindmatch-runtime` drives it in real time.
//!
//! ## Timing Contract
//!
//! Default durations in milliseconds:
//! - Replay pulse: 400, gap: 100
//! - Click feedback pulse: 200, gap: 100
//! - Lead-in before a replay: 500
//! - Settle delay after a completed round: 800

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod persistence;
pub mod playback;
pub mod score_store;
pub mod sequence;
pub mod session;
pub mod timer;
pub mod types;
pub mod validator;

pub use config::MindMatchConfig;
pub use error::MindMatchError;
pub use events::SessionEvent;
pub use score_store::ScoreStore;
pub use session::GameSession;
pub use types::*;
