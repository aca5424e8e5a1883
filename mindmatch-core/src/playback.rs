//! Playback scheduling — replays a tile sequence as timed pulses.
//!
//! A replay lights each tile of the sequence for `pulse`, darkens it for
//! `gap`, and moves on to the next one. An echo is the same thing for a
//! single clicked tile with shorter timing. Both run on the scheduler's own
//! [`TimerQueue`], so [`PlaybackScheduler::cancel`] stops them at any pulse
//! boundary without leaving a timer behind.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::timer::TimerQueue;
use crate::types::Tile;

/// Shape of one pulse: how long a tile is lit, then how long it stays dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTiming {
    /// Time the tile is active.
    pub pulse: Duration,
    /// Time the tile is dark before the next pulse.
    pub gap: Duration,
}

/// What is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// The target sequence, shown to the player.
    Replay,
    /// Feedback for a single player click.
    Echo,
}

/// Observable change produced by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    /// The lit tile changed (`None` means every tile is dark).
    ActiveTile(Option<Tile>),
    /// The run finished with no tile lit.
    Finished(PlaybackMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Light the tile at the current index (or finish).
    PulseStart,
    /// Darken the current tile.
    PulseEnd,
}

#[derive(Debug)]
struct Run {
    mode: PlaybackMode,
    tiles: Vec<Tile>,
    index: usize,
    timing: PulseTiming,
}

/// Sequential, non-reentrant pulse player.
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    timers: TimerQueue<Step>,
    run: Option<Run>,
    active: Option<Tile>,
}

impl PlaybackScheduler {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start replaying `tiles`. The first pulse starts `lead_in` after `now`.
    ///
    /// Anything already in flight is cancelled first; the session's phase
    /// guarantees that is never another replay.
    pub fn replay(
        &mut self,
        now: Duration,
        tiles: &[Tile],
        timing: PulseTiming,
        lead_in: Duration,
    ) -> Option<PlaybackSignal> {
        if self.mode() == Some(PlaybackMode::Replay) {
            warn!("Replay requested while another replay is in flight");
        }
        let cleared = self.cancel();
        debug!(tiles = tiles.len(), lead_in_ms = lead_in.as_millis(), "Replay scheduled");
        self.run = Some(Run {
            mode: PlaybackMode::Replay,
            tiles: tiles.to_vec(),
            index: 0,
            timing,
        });
        self.timers.schedule(now + lead_in, Step::PulseStart);
        cleared.then_some(PlaybackSignal::ActiveTile(None))
    }

    /// Flash a single clicked tile right away.
    ///
    /// Replaces a previous echo. Refused while a replay is in flight.
    pub fn echo(&mut self, now: Duration, tile: Tile, timing: PulseTiming) -> Option<PlaybackSignal> {
        if self.mode() == Some(PlaybackMode::Replay) {
            debug!(%tile, "Echo refused during replay");
            return None;
        }
        self.timers.clear();
        self.run = Some(Run {
            mode: PlaybackMode::Echo,
            tiles: vec![tile],
            index: 0,
            timing,
        });
        self.light(now, tile)
    }

    /// Stop whatever is playing and drop every pending pulse.
    ///
    /// Returns `true` if a lit tile was darkened.
    pub fn cancel(&mut self) -> bool {
        let dropped = self.timers.clear();
        if let Some(run) = self.run.take() {
            debug!(mode = ?run.mode, at = run.index, dropped, "Playback cancelled");
        }
        self.active.take().is_some()
    }

    /// Deadline of the next pulse boundary.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Fire the next pulse boundary if it is due at `now`.
    ///
    /// Returns `None` when nothing was due. A single boundary may produce
    /// two signals (the last tile going dark is reported separately from
    /// the run finishing), so they are appended to `out`.
    pub fn fire_due(&mut self, now: Duration, out: &mut Vec<PlaybackSignal>) -> Option<Duration> {
        let (at, step) = self.timers.pop_due(now)?;
        match step {
            Step::PulseStart => self.on_pulse_start(at, out),
            Step::PulseEnd => self.on_pulse_end(at, out),
        }
        Some(at)
    }

    /// Tile currently lit, if any.
    #[must_use]
    pub fn active_tile(&self) -> Option<Tile> {
        self.active
    }

    /// Mode of the run in flight, if any.
    #[must_use]
    pub fn mode(&self) -> Option<PlaybackMode> {
        self.run.as_ref().map(|run| run.mode)
    }

    /// Whether a replay or echo is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    fn on_pulse_start(&mut self, at: Duration, out: &mut Vec<PlaybackSignal>) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        let next = run.tiles.get(run.index).copied();
        match next {
            Some(tile) => out.extend(self.light(at, tile)),
            None => out.push(self.finish()),
        }
    }

    fn on_pulse_end(&mut self, at: Duration, out: &mut Vec<PlaybackSignal>) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        run.index += 1;
        let gap = run.timing.gap;
        if self.active.take().is_some() {
            out.push(PlaybackSignal::ActiveTile(None));
        }
        trace!(next = run.index, "Pulse ended");
        self.timers.schedule(at + gap, Step::PulseStart);
    }

    fn light(&mut self, at: Duration, tile: Tile) -> Option<PlaybackSignal> {
        let pulse = self.run.as_ref()?.timing.pulse;
        self.active = Some(tile);
        trace!(%tile, "Pulse started");
        self.timers.schedule(at + pulse, Step::PulseEnd);
        Some(PlaybackSignal::ActiveTile(Some(tile)))
    }

    fn finish(&mut self) -> PlaybackSignal {
        let mode = self.run.take().map_or(PlaybackMode::Replay, |run| run.mode);
        self.active = None;
        debug!(?mode, "Playback finished");
        PlaybackSignal::Finished(mode)
    }
}
