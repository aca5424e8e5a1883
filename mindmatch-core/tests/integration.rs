//! Integration Tests — End-to-End Game Flows
//!
//! Full games driven through the public API: start, replay, input,
//! round progression, game over and the persisted high score.

use std::time::Duration;

use mindmatch_core::config::{PersistenceConfig, StoreBackend, TimingConfig};
use mindmatch_core::score_store::{KeyValueStore, MemoryStore};
use mindmatch_core::sequence::ScriptedTiles;
use mindmatch_core::{
    ClickOutcome, GameOverCause, GameSession, IgnoreReason, ScoreStore, SessionEvent, SessionPhase,
    Tile, Verdict,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn tiles(indices: &[u8]) -> Vec<Tile> {
    indices.iter().map(|i| Tile::new(*i).expect("valid tile")).collect()
}

fn scripted(script: &[u8], store: ScoreStore) -> GameSession {
    GameSession::new(TimingConfig::default(), store).with_tile_source(ScriptedTiles::from_indices(script))
}

/// Let the current replay run to completion.
fn finish_replay(game: &mut GameSession) {
    let wait = TimingConfig::default().replay_duration(game.target_sequence().len());
    game.advance_by(wait);
    assert_eq!(game.phase(), SessionPhase::AwaitingInput);
}

/// Let the settle delay elapse after a completed round.
fn settle(game: &mut GameSession) {
    game.advance_by(TimingConfig::default().settle_delay());
    assert_eq!(game.phase(), SessionPhase::Playback);
}

/// Repeat the whole target sequence correctly.
fn play_round(game: &mut GameSession) {
    finish_replay(game);
    let target = game.target_sequence().to_vec();
    for tile in target {
        assert!(game.on_tile_clicked(tile.index()).verdict().is_some());
    }
    assert_eq!(game.phase(), SessionPhase::RoundComplete);
}

// ---------------------------------------------------------------------------
// Scenario A: first round
// ---------------------------------------------------------------------------

#[test]
fn first_round_grows_sequence_after_settle_delay() {
    let mut game = scripted(&[1, 3], ScoreStore::in_memory());
    assert!(game.start_game());
    assert_eq!(game.target_sequence(), tiles(&[1]).as_slice());

    // Exactly one pulse of the single tile.
    game.drain_events();
    finish_replay(&mut game);
    let lit: Vec<SessionEvent> = game
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::ActiveTileChanged(Some(_))))
        .collect();
    assert_eq!(lit, vec![SessionEvent::ActiveTileChanged(Tile::new(1))]);

    assert_eq!(
        game.on_tile_clicked(1),
        ClickOutcome::Accepted(Verdict::RoundComplete)
    );
    assert_eq!(game.score(), 10);

    settle(&mut game);
    assert_eq!(game.level(), 2);
    assert_eq!(game.target_sequence(), tiles(&[1, 3]).as_slice());
}

// ---------------------------------------------------------------------------
// Scenario B: mismatch on the third tile
// ---------------------------------------------------------------------------

#[test]
fn third_tile_mismatch_ends_game_with_twenty_points() {
    let backend = MemoryStore::new();
    let mut game = scripted(
        &[2, 0, 3],
        ScoreStore::new(backend.clone(), ScoreStore::DEFAULT_KEY),
    );
    game.start_game();

    // Rounds of [2] and [2, 0] first, so the third round plays [2, 0, 3].
    play_round(&mut game);
    settle(&mut game);
    play_round(&mut game);
    settle(&mut game);
    assert_eq!(game.target_sequence(), tiles(&[2, 0, 3]).as_slice());
    let before = game.score();
    finish_replay(&mut game);

    assert_eq!(game.on_tile_clicked(2), ClickOutcome::Accepted(Verdict::Continue));
    assert_eq!(game.on_tile_clicked(0), ClickOutcome::Accepted(Verdict::Continue));
    assert_eq!(game.on_tile_clicked(1), ClickOutcome::Accepted(Verdict::Mismatch));

    assert_eq!(game.phase(), SessionPhase::GameOver);
    assert_eq!(game.score(), before + 20, "only the two correct clicks score");
    assert_eq!(game.high_score(), game.score());
    assert_eq!(
        backend.get(ScoreStore::DEFAULT_KEY).expect("get"),
        Some(i64::from(game.score()))
    );

    let over = game
        .drain_events()
        .into_iter()
        .find(|e| matches!(e, SessionEvent::GameOver { .. }))
        .expect("game over event");
    assert_eq!(
        over,
        SessionEvent::GameOver {
            final_score: before + 20,
            high_score: before + 20,
            new_high_score: true,
            cause: GameOverCause::Mismatch {
                expected: Tile::new(3).expect("valid tile"),
                selected: Tile::new(1).expect("valid tile"),
            },
        }
    );
}

// ---------------------------------------------------------------------------
// Scenario C: clicks during non-interactive phases
// ---------------------------------------------------------------------------

#[test]
fn clicks_during_playback_and_settle_have_no_effect() {
    let mut game = scripted(&[0, 1], ScoreStore::in_memory());
    game.start_game();
    game.advance(ms(600)); // mid-pulse
    game.drain_events();

    assert_eq!(
        game.on_tile_clicked(0),
        ClickOutcome::Ignored(IgnoreReason::NotAcceptingInput(SessionPhase::Playback))
    );
    assert!(game.player_sequence().is_empty());
    assert_eq!(game.score(), 0);
    assert!(game.drain_events().is_empty());

    game.advance(ms(1_000));
    game.on_tile_clicked(0);
    assert_eq!(game.phase(), SessionPhase::RoundComplete);
    assert_eq!(
        game.on_tile_clicked(1),
        ClickOutcome::Ignored(IgnoreReason::NotAcceptingInput(SessionPhase::RoundComplete))
    );
    assert_eq!(game.score(), 10);
    assert_eq!(game.player_sequence(), tiles(&[0]).as_slice());
}

// ---------------------------------------------------------------------------
// Scenario D: abandon mid-replay
// ---------------------------------------------------------------------------

#[test]
fn abandon_mid_replay_cancels_remaining_pulses() {
    let mut game = scripted(&[0, 1, 2, 3], ScoreStore::in_memory());
    game.start_game();
    play_round(&mut game);
    settle(&mut game);
    play_round(&mut game);
    settle(&mut game);

    // Third replay: first pulse is lit.
    game.advance_by(ms(600));
    assert!(game.active_tile().is_some());
    game.drain_events();

    assert!(game.abandon());
    assert_eq!(game.phase(), SessionPhase::GameOver);
    assert_eq!(game.active_tile(), None);
    assert_eq!(game.next_deadline(), None);

    let events = game.drain_events();
    assert_eq!(events[0], SessionEvent::ActiveTileChanged(None));
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::GameOver {
            cause: GameOverCause::Abandoned,
            ..
        }
    )));

    game.advance_by(ms(10_000));
    assert!(game.drain_events().is_empty(), "no stale pulse may fire");
}

// ---------------------------------------------------------------------------
// Scenario E: high score across sessions
// ---------------------------------------------------------------------------

#[test]
fn high_score_only_saved_when_beaten() {
    let backend = MemoryStore::new();
    let store = ScoreStore::new(backend.clone(), ScoreStore::DEFAULT_KEY);
    assert_eq!(store.load(), 0);

    // Game 1: three correct tiles (rounds of 1 and 2), then a wrong one.
    let mut game = scripted(&[0, 1, 2], store);
    game.start_game();
    play_round(&mut game);
    settle(&mut game);
    play_round(&mut game);
    settle(&mut game);
    finish_replay(&mut game);
    game.on_tile_clicked(3);
    assert_eq!(game.score(), 30);
    assert_eq!(backend.write_count(), 1);

    // A new manager sees the persisted value.
    let reloaded = ScoreStore::new(backend.clone(), ScoreStore::DEFAULT_KEY);
    assert_eq!(reloaded.load(), 30);

    // Game 2: one round, then a wrong tile, ending on 10 points.
    let mut second = scripted(&[1, 1], reloaded);
    assert_eq!(second.high_score(), 30);
    second.start_game();
    play_round(&mut second);
    settle(&mut second);
    finish_replay(&mut second);
    second.on_tile_clicked(0);
    assert_eq!(second.score(), 10);
    assert_eq!(second.high_score(), 30);
    assert_eq!(backend.write_count(), 1, "lower score must not be saved");
}

#[test]
fn high_score_persists_in_json_file_between_processes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = PersistenceConfig {
        backend: StoreBackend::Json,
        path: dir.path().join("scores.json"),
        ..PersistenceConfig::default()
    };

    let mut game = scripted(&[2], ScoreStore::open(&config).expect("open"));
    game.start_game();
    play_round(&mut game);
    assert!(game.abandon());
    assert_eq!(game.high_score(), 10);

    let again = GameSession::new(TimingConfig::default(), ScoreStore::open(&config).expect("reopen"));
    assert_eq!(again.high_score(), 10);
}

#[test]
fn high_score_persists_in_sqlite_between_processes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = PersistenceConfig {
        backend: StoreBackend::Sqlite,
        path: dir.path().join("scores.db"),
        ..PersistenceConfig::default()
    };

    let mut game = scripted(&[3, 3], ScoreStore::open(&config).expect("open"));
    game.start_game();
    play_round(&mut game);
    settle(&mut game);
    play_round(&mut game);
    game.abandon();
    assert_eq!(game.score(), 30);
    drop(game);

    let again = GameSession::new(TimingConfig::default(), ScoreStore::open(&config).expect("reopen"));
    assert_eq!(again.high_score(), 30);
}

// ---------------------------------------------------------------------------
// Restart
// ---------------------------------------------------------------------------

#[test]
fn restart_after_game_over_resets_everything() {
    let mut game = scripted(&[0, 1, 2], ScoreStore::in_memory());
    game.start_game();
    play_round(&mut game);
    settle(&mut game);
    finish_replay(&mut game);
    game.on_tile_clicked(3);
    assert_eq!(game.phase(), SessionPhase::GameOver);
    let first_session = game.session_id();

    assert!(game.start_game());
    assert_eq!(game.phase(), SessionPhase::Playback);
    assert_eq!(game.target_sequence().len(), 1);
    assert_eq!(game.score(), 0);
    assert_eq!(game.level(), 1);
    assert!(game.player_sequence().is_empty());
    assert_ne!(game.session_id(), first_session);
    assert_eq!(game.high_score(), 10);
}

#[test]
fn snapshot_reflects_observable_state() {
    let mut game = scripted(&[2, 1], ScoreStore::in_memory());
    game.start_game();
    game.advance(ms(500));

    let snap = game.snapshot();
    assert_eq!(snap.phase, SessionPhase::Playback);
    assert_eq!(snap.active_tile, Tile::new(2));
    assert_eq!(snap.level, 1);
    assert_eq!(snap.progress, 0);
    assert_eq!(snap.phase.status_label(), "Watch...");

    let json = serde_json::to_string(&snap).expect("serialize");
    assert!(json.contains("\"Playback\""));
}
