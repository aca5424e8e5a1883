//! Runs a [`GameSession`] on a tokio task.
//!
//! The task owns the session outright. Callers talk to it through a
//! [`SessionHandle`]: every command travels over an unbounded `mpsc`
//! channel and is answered on a `oneshot`. Between commands the task sleeps
//! until the session's next deadline, then calls
//! [`GameSession::advance`] with the elapsed time.
//!
//! The session clock is pinned to the task's start: `virtual = base +
//! elapsed`, where `base` is the session clock when the task was spawned.

use std::time::Duration;

use mindmatch_core::config::MindMatchConfig;
use mindmatch_core::{ClickOutcome, GameSession, ScoreStore, SessionEvent, SessionSnapshot};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::error::{Result, RuntimeError};

/// Buffered events per subscriber before the slowest one starts lagging.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug)]
enum Command {
    StartGame {
        respond: oneshot::Sender<bool>,
    },
    Abandon {
        respond: oneshot::Sender<bool>,
    },
    Click {
        index: u8,
        respond: oneshot::Sender<ClickOutcome>,
    },
    Snapshot {
        respond: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown,
}

/// Handle to a session running on its own task.
///
/// Dropping the handle stops the task once its command queue drains.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SessionEvent>,
    task: JoinHandle<GameSession>,
}

/// Move `session` onto a new tokio task and return a handle to it.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_session(session: GameSession) -> SessionHandle {
    let (commands, rx) = mpsc::unbounded_channel();
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    let task = tokio::spawn(run(session, rx, events.clone()));
    SessionHandle {
        commands,
        events,
        task,
    }
}

/// Build a session from `config` (timing and high-score store) and spawn it.
///
/// # Errors
/// Returns [`RuntimeError::Core`] if the high-score store cannot be opened.
pub fn spawn_from_config(config: &MindMatchConfig) -> Result<SessionHandle> {
    let store = ScoreStore::open(&config.persistence)?;
    Ok(spawn_session(GameSession::new(config.timing, store)))
}

impl SessionHandle {
    /// Start a new game. `false` if one is already in progress.
    ///
    /// # Errors
    /// Returns [`RuntimeError::Closed`] if the driver has stopped.
    pub async fn start_game(&self) -> Result<bool> {
        self.request(|respond| Command::StartGame { respond }).await
    }

    /// Abandon the game in progress. `false` if there was none.
    ///
    /// # Errors
    /// Returns [`RuntimeError::Closed`] if the driver has stopped.
    pub async fn abandon(&self) -> Result<bool> {
        self.request(|respond| Command::Abandon { respond }).await
    }

    /// Click the tile with palette index `index`.
    ///
    /// # Errors
    /// Returns [`RuntimeError::Closed`] if the driver has stopped.
    pub async fn click(&self, index: u8) -> Result<ClickOutcome> {
        self.request(|respond| Command::Click { index, respond }).await
    }

    /// Current observable state.
    ///
    /// # Errors
    /// Returns [`RuntimeError::Closed`] if the driver has stopped.
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|respond| Command::Snapshot { respond }).await
    }

    /// Receive every event published from now on.
    ///
    /// Events caused by a command are published before that command's
    /// reply is sent.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether the driver task has stopped accepting commands.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Stop the driver and take the session back.
    ///
    /// Commands queued before this call are still applied.
    ///
    /// # Errors
    /// Returns [`RuntimeError::Join`] if the driver task panicked.
    pub async fn shutdown(self) -> Result<GameSession> {
        // A closed channel means the task is already finishing.
        let _ = self.commands.send(Command::Shutdown);
        Ok(self.task.await?)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (respond, reply) = oneshot::channel();
        self.commands
            .send(make(respond))
            .map_err(|_| RuntimeError::Closed)?;
        reply.await.map_err(|_| RuntimeError::Closed)
    }
}

// ---------------------------------------------------------------------------
// Driver task
// ---------------------------------------------------------------------------

async fn run(
    mut session: GameSession,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<SessionEvent>,
) -> GameSession {
    let started = Instant::now();
    let base = session.clock();
    info!(clock_ms = base.as_millis(), "Session driver started");

    loop {
        let wake = session
            .next_deadline()
            .map(|at| started + at.saturating_sub(base));

        tokio::select! {
            command = commands.recv() => {
                session.advance(base + started.elapsed());
                let Some(command) = command else {
                    debug!("All handles dropped");
                    break;
                };
                if !execute(&mut session, command, &events) {
                    break;
                }
            }
            () = sleep_until_some(wake) => {
                if let Some(at) = wake {
                    warn_if_late(at);
                }
                session.advance(base + started.elapsed());
                publish(&mut session, &events);
            }
        }
    }

    publish(&mut session, &events);
    info!(
        clock_ms = session.clock().as_millis(),
        phase = %session.phase(),
        "Session driver stopped"
    );
    session
}

/// Apply one command. Returns `false` when the driver should stop.
fn execute(
    session: &mut GameSession,
    command: Command,
    events: &broadcast::Sender<SessionEvent>,
) -> bool {
    match command {
        Command::StartGame { respond } => {
            let started = session.start_game();
            publish(session, events);
            let _ = respond.send(started);
        }
        Command::Abandon { respond } => {
            let abandoned = session.abandon();
            publish(session, events);
            let _ = respond.send(abandoned);
        }
        Command::Click { index, respond } => {
            let outcome = session.on_tile_clicked(index);
            publish(session, events);
            let _ = respond.send(outcome);
        }
        Command::Snapshot { respond } => {
            publish(session, events);
            let _ = respond.send(session.snapshot());
        }
        Command::Shutdown => {
            debug!("Shutdown requested");
            return false;
        }
    }
    true
}

fn publish(session: &mut GameSession, events: &broadcast::Sender<SessionEvent>) {
    for event in session.drain_events() {
        if let SessionEvent::GameOver { final_score, .. } = event {
            info!(final_score, "Publishing game over");
        }
        // No subscribers is fine; the event is simply dropped.
        if events.send(event).is_err() {
            debug!(kind = event.kind(), "Event dropped, no subscribers");
        }
    }
}

async fn sleep_until_some(wake: Option<Instant>) {
    match wake {
        Some(at) => sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// How far behind its deadline a wake-up may be before it is logged.
const LATE_WARN: Duration = Duration::from_millis(50);

fn warn_if_late(scheduled: Instant) {
    let late = Instant::now().saturating_duration_since(scheduled);
    if late > LATE_WARN {
        warn!(late_ms = late.as_millis(), "Timer fired late");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmatch_core::config::TimingConfig;
    use mindmatch_core::sequence::ScriptedTiles;
    use mindmatch_core::{SessionPhase, Tile, Verdict};
    use tokio::sync::broadcast::error::TryRecvError;

    fn scripted(script: &[u8]) -> GameSession {
        GameSession::new(TimingConfig::default(), ScoreStore::in_memory())
            .with_tile_source(ScriptedTiles::from_indices(script))
    }

    fn assert_on_time(elapsed: Duration, expected: Duration) {
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(5),
            "expected ~{expected:?}, took {elapsed:?}"
        );
    }

    async fn wait_for_phase(rx: &mut broadcast::Receiver<SessionEvent>, phase: SessionPhase) {
        loop {
            if let SessionEvent::PhaseChanged { to, .. } = rx.recv().await.expect("event stream") {
                if to == phase {
                    return;
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replay_runs_on_real_timers() {
        let handle = spawn_session(scripted(&[2, 0]));
        let mut rx = handle.subscribe();

        assert!(handle.start_game().await.expect("start"));
        assert!(!handle.start_game().await.expect("second start"));

        let before = Instant::now();
        let mut lit = None;
        loop {
            match rx.recv().await.expect("event stream") {
                SessionEvent::ActiveTileChanged(Some(tile)) => lit = Some(tile),
                SessionEvent::PhaseChanged {
                    to: SessionPhase::AwaitingInput,
                    ..
                } => break,
                _ => {}
            }
        }
        assert_eq!(lit, Tile::new(2));
        assert_on_time(before.elapsed(), TimingConfig::default().replay_duration(1));

        let snap = handle.snapshot().await.expect("snapshot");
        assert_eq!(snap.phase, SessionPhase::AwaitingInput);
        assert_eq!(snap.level, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn full_round_then_shutdown_returns_session() {
        let handle = spawn_session(scripted(&[1, 3]));
        let mut rx = handle.subscribe();
        handle.start_game().await.expect("start");
        wait_for_phase(&mut rx, SessionPhase::AwaitingInput).await;

        assert_eq!(
            handle.click(1).await.expect("click"),
            ClickOutcome::Accepted(Verdict::RoundComplete)
        );
        loop {
            if rx.recv().await.expect("event stream") == SessionEvent::LevelChanged(2) {
                break;
            }
        }
        wait_for_phase(&mut rx, SessionPhase::AwaitingInput).await;

        let session = handle.shutdown().await.expect("shutdown");
        assert_eq!(session.score(), 10);
        assert_eq!(session.level(), 2);
        assert_eq!(session.phase(), SessionPhase::AwaitingInput);
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_stops_pending_pulses() {
        let handle = spawn_session(scripted(&[0]));
        let mut rx = handle.subscribe();
        handle.start_game().await.expect("start");
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(handle.abandon().await.expect("abandon"));
        assert_eq!(
            handle.snapshot().await.expect("snapshot").phase,
            SessionPhase::GameOver
        );
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert!(!handle.abandon().await.expect("second abandon"));
    }

    #[tokio::test(start_paused = true)]
    async fn clicks_outside_input_phase_are_ignored() {
        let handle = spawn_session(scripted(&[3]));
        assert!(matches!(
            handle.click(3).await.expect("click"),
            ClickOutcome::Ignored(_)
        ));
        handle.start_game().await.expect("start");
        assert!(matches!(
            handle.click(3).await.expect("click"),
            ClickOutcome::Ignored(_)
        ));
        let snap = handle.snapshot().await.expect("snapshot");
        assert_eq!(snap.progress, 0);
        assert_eq!(snap.score, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_after_shutdown_report_closed() {
        let handle = spawn_session(scripted(&[0]));
        handle.commands.send(Command::Shutdown).expect("send");
        assert!(matches!(handle.click(0).await, Err(RuntimeError::Closed)));
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_from_config_uses_configured_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let toml = format!(
            "[persistence]\nbackend = \"sqlite\"\npath = {:?}\n\n[timing]\nlead_in_ms = 100\n",
            dir.path().join("scores.db")
        );
        let config = MindMatchConfig::from_toml(&toml).expect("config");
        let handle = spawn_from_config(&config).expect("spawn");
        let mut rx = handle.subscribe();
        handle.start_game().await.expect("start");

        let before = Instant::now();
        wait_for_phase(&mut rx, SessionPhase::AwaitingInput).await;
        assert_on_time(before.elapsed(), config.timing.replay_duration(1));
        handle.shutdown().await.expect("shutdown");
    }
}
