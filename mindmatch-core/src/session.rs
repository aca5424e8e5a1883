//! The game session state machine.
//!
//! ```text
//!   Idle ──start_game──▶ Playback ──replay done──▶ AwaitingInput
//!                          ▲                        │   │   ▲
//!                          │               last tile│   │   │ correct tile
//!                    settle delay                   ▼   │   └──────┘
//!                          └────────────────── RoundComplete
//!                                                       │ wrong tile
//!   GameOver ◀──────────────────────────────────────────┘
//!   GameOver ◀── abandon ── any of Playback / AwaitingInput / RoundComplete
//!   GameOver ──start_game──▶ Idle ──▶ Playback
//! ```
//!
//! The session never reads a clock. [`GameSession::advance`] moves its
//! clock forward and fires every timer that became due, in order; commands
//! apply at the current clock. Replay and input collection are separated by
//! [`SessionPhase`] alone: a click outside `AwaitingInput` is discarded
//! before it can touch any state.

use std::time::Duration;

use tracing::{debug, info, info_span, trace};

use crate::config::TimingConfig;
use crate::events::SessionEvent;
use crate::playback::{PlaybackMode, PlaybackScheduler, PlaybackSignal};
use crate::score_store::ScoreStore;
use crate::sequence::{SequenceGenerator, TileSource};
use crate::timer::TimerQueue;
use crate::types::{
    ClickOutcome, GameOverCause, IgnoreReason, SessionId, SessionPhase, SessionSnapshot, Tile,
    Verdict, POINTS_PER_TILE,
};
use crate::validator;

/// Timers owned by the session itself (pulses belong to the scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTimer {
    /// Settle delay elapsed: grow the sequence and replay it.
    NextRound,
}

/// One player's game: sequences, counters, phase and pending timers.
pub struct GameSession {
    timing: TimingConfig,
    tiles: Box<dyn TileSource + Send>,
    playback: PlaybackScheduler,
    timers: TimerQueue<SessionTimer>,
    store: ScoreStore,
    phase: SessionPhase,
    target: Vec<Tile>,
    player: Vec<Tile>,
    score: u32,
    high_score: u32,
    session: Option<SessionId>,
    clock: Duration,
    events: Vec<SessionEvent>,
    signals: Vec<PlaybackSignal>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("session", &self.session)
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("level", &self.level())
            .field("high_score", &self.high_score)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Create an idle session with random tiles.
    ///
    /// The high score is read from `store` once, here.
    #[must_use]
    pub fn new(timing: TimingConfig, store: ScoreStore) -> Self {
        let high_score = store.load();
        info!(high_score, key = store.key(), "Game session created");
        Self {
            timing,
            tiles: Box::new(SequenceGenerator::from_entropy()),
            playback: PlaybackScheduler::new(),
            timers: TimerQueue::new(),
            store,
            phase: SessionPhase::Idle,
            target: Vec::new(),
            player: Vec::new(),
            score: 0,
            high_score,
            session: None,
            clock: Duration::ZERO,
            events: Vec::new(),
            signals: Vec::new(),
        }
    }

    /// Replace the tile source (seeded generator, scripted tiles, ...).
    #[must_use]
    pub fn with_tile_source(mut self, tiles: impl TileSource + Send + 'static) -> Self {
        self.tiles = Box::new(tiles);
        self
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Start a new game from `Idle` or `GameOver`.
    ///
    /// Returns `false` (and changes nothing) while a game is in progress.
    pub fn start_game(&mut self) -> bool {
        if self.phase.is_active() {
            debug!(phase = %self.phase, "start_game ignored, game in progress");
            return false;
        }
        if self.phase == SessionPhase::GameOver {
            self.set_phase(SessionPhase::Idle);
        }

        self.cancel_pending();
        let session = SessionId::new();
        self.session = Some(session);
        self.score = 0;
        self.player.clear();
        self.target.clear();
        self.target.push(self.tiles.next_tile());

        let _span = info_span!("game", %session).entered();
        info!(high_score = self.high_score, "Game started");
        self.events.push(SessionEvent::ScoreChanged(0));
        self.events.push(SessionEvent::LevelChanged(self.level()));
        self.begin_playback();
        true
    }

    /// End the game in progress, cancelling any replay or pending round.
    ///
    /// The score reached so far is still compared with the high score.
    /// Returns `false` if no game was in progress.
    pub fn abandon(&mut self) -> bool {
        if !self.phase.is_active() {
            debug!(phase = %self.phase, "abandon ignored, no game in progress");
            return false;
        }
        self.cancel_pending();
        self.enter_game_over(GameOverCause::Abandoned);
        true
    }

    /// Handle a click on the tile with palette index `index`.
    ///
    /// Clicks on invalid indices or outside `AwaitingInput` are ignored
    /// without touching any state.
    pub fn on_tile_clicked(&mut self, index: u8) -> ClickOutcome {
        let Some(tile) = Tile::new(index) else {
            debug!(index, "Click on invalid tile ignored");
            return ClickOutcome::Ignored(IgnoreReason::InvalidTile(index));
        };
        if !self.phase.accepts_input() {
            trace!(%tile, phase = %self.phase, "Click ignored");
            return ClickOutcome::Ignored(IgnoreReason::NotAcceptingInput(self.phase));
        }

        if let Some(signal) = self.playback.echo(self.clock, tile, self.timing.feedback()) {
            self.signals.push(signal);
            self.apply_signals();
        }

        let position = self.player.len();
        let verdict = validator::submit(tile, position, &self.target);
        debug!(%tile, position, ?verdict, "Tile submitted");

        match verdict {
            Verdict::Continue => self.accept(tile),
            Verdict::RoundComplete => {
                self.accept(tile);
                self.set_phase(SessionPhase::RoundComplete);
                let at = self.clock + self.timing.settle_delay();
                self.timers.schedule(at, SessionTimer::NextRound);
                info!(level = self.level(), score = self.score, "Round complete");
            }
            Verdict::Mismatch => {
                let expected = self.target[position];
                self.enter_game_over(GameOverCause::Mismatch {
                    expected,
                    selected: tile,
                });
            }
        }
        ClickOutcome::Accepted(verdict)
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Move the clock to `now`, firing every timer due on the way.
    ///
    /// Timers fire at their own deadline, so one large step behaves like
    /// many small ones. A `now` earlier than the current clock is ignored.
    pub fn advance(&mut self, now: Duration) {
        while let Some(at) = self.next_deadline().filter(|at| *at <= now) {
            self.clock = self.clock.max(at);
            let pulse_first = self
                .playback
                .next_deadline()
                .is_some_and(|pulse| self.timers.next_deadline().is_none_or(|own| pulse <= own));
            if pulse_first {
                self.playback.fire_due(at, &mut self.signals);
                self.apply_signals();
            } else if let Some((_, timer)) = self.timers.pop_due(at) {
                self.on_timer(timer);
            }
        }
        self.clock = self.clock.max(now);
    }

    /// Advance the clock by `delta`.
    pub fn advance_by(&mut self, delta: Duration) {
        self.advance(self.clock + delta);
    }

    /// Clock time of the next pending timer, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.playback.next_deadline(), self.timers.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Current clock time.
    #[must_use]
    pub fn clock(&self) -> Duration {
        self.clock
    }

    // ------------------------------------------------------------------
    // Observable state
    // ------------------------------------------------------------------

    /// Take every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Tile lit by a replay pulse or click feedback.
    #[must_use]
    pub fn active_tile(&self) -> Option<Tile> {
        self.playback.active_tile()
    }

    /// Running score.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Current level: the target sequence length (1 before the first game).
    #[must_use]
    pub fn level(&self) -> u32 {
        u32::try_from(self.target.len().max(1)).unwrap_or(u32::MAX)
    }

    /// Best score reached at any game over, including earlier processes.
    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Sequence the player has to reproduce.
    #[must_use]
    pub fn target_sequence(&self) -> &[Tile] {
        &self.target
    }

    /// Tiles the player matched so far this round.
    #[must_use]
    pub fn player_sequence(&self) -> &[Tile] {
        &self.player
    }

    /// Current game, if one was started.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session
    }

    /// Everything needed to render the game.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session,
            phase: self.phase,
            active_tile: self.active_tile(),
            score: self.score,
            level: self.level(),
            high_score: self.high_score,
            progress: self.player.len(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn accept(&mut self, tile: Tile) {
        self.player.push(tile);
        self.score += POINTS_PER_TILE;
        self.events.push(SessionEvent::ScoreChanged(self.score));
    }

    fn begin_playback(&mut self) {
        self.set_phase(SessionPhase::Playback);
        let signal = self.playback.replay(
            self.clock,
            &self.target,
            self.timing.replay(),
            self.timing.lead_in(),
        );
        self.signals.extend(signal);
        self.apply_signals();
    }

    fn on_timer(&mut self, timer: SessionTimer) {
        match timer {
            SessionTimer::NextRound => {
                if self.phase != SessionPhase::RoundComplete {
                    return;
                }
                self.target.push(self.tiles.next_tile());
                self.player.clear();
                self.events.push(SessionEvent::LevelChanged(self.level()));
                debug!(level = self.level(), "Sequence extended");
                self.begin_playback();
            }
        }
    }

    fn apply_signals(&mut self) {
        for signal in std::mem::take(&mut self.signals) {
            match signal {
                PlaybackSignal::ActiveTile(tile) => {
                    self.events.push(SessionEvent::ActiveTileChanged(tile));
                }
                PlaybackSignal::Finished(PlaybackMode::Replay) => {
                    if self.phase == SessionPhase::Playback {
                        self.set_phase(SessionPhase::AwaitingInput);
                    }
                }
                PlaybackSignal::Finished(PlaybackMode::Echo) => {}
            }
        }
    }

    /// Drop every pending pulse and round timer.
    fn cancel_pending(&mut self) {
        if self.playback.cancel() {
            self.events.push(SessionEvent::ActiveTileChanged(None));
        }
        let dropped = self.timers.clear();
        if dropped > 0 {
            debug!(dropped, "Pending round start cancelled");
        }
    }

    fn enter_game_over(&mut self, cause: GameOverCause) {
        self.set_phase(SessionPhase::GameOver);
        let new_high_score = self.score > self.high_score;
        if new_high_score {
            self.high_score = self.score;
            self.store.save(self.score);
        }
        info!(
            session = ?self.session,
            score = self.score,
            high_score = self.high_score,
            new_high_score,
            ?cause,
            "Game over"
        );
        self.events.push(SessionEvent::GameOver {
            final_score: self.score,
            high_score: self.high_score,
            new_high_score,
            cause,
        });
    }

    fn set_phase(&mut self, to: SessionPhase) {
        let from = std::mem::replace(&mut self.phase, to);
        if from != to {
            trace!(%from, %to, "Phase changed");
            self.events.push(SessionEvent::PhaseChanged { from, to });
        }
    }
}
