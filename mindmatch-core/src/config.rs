//! Configuration for the Mind Match game.
//!
//! Maps directly to `mindmatch.toml`. Every field has a default, so an
//! empty file (or no file at all) gives the standard game.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MindMatchConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Replay, feedback and round timing.
    #[serde(default)]
    pub timing: TimingConfig,
    /// High-score persistence.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl MindMatchConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MindMatchError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::MindMatchError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Timing of replays, click feedback and round transitions, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// How long each tile stays lit during a replay.
    #[serde(default = "default_400")]
    pub pulse_ms: u64,
    /// Dark pause after each replay pulse.
    #[serde(default = "default_100")]
    pub gap_ms: u64,
    /// How long a clicked tile stays lit as feedback.
    #[serde(default = "default_200")]
    pub feedback_pulse_ms: u64,
    /// Dark pause after a feedback pulse.
    #[serde(default = "default_100")]
    pub feedback_gap_ms: u64,
    /// Pause between entering playback and the first pulse.
    #[serde(default = "default_500")]
    pub lead_in_ms: u64,
    /// Pause between a completed round and the next tile being added.
    #[serde(default = "default_800")]
    pub settle_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pulse_ms: 400,
            gap_ms: 100,
            feedback_pulse_ms: 200,
            feedback_gap_ms: 100,
            lead_in_ms: 500,
            settle_delay_ms: 800,
        }
    }
}

impl TimingConfig {
    /// Pulse shape for replaying the target sequence.
    #[must_use]
    pub fn replay(&self) -> crate::playback::PulseTiming {
        crate::playback::PulseTiming {
            pulse: Duration::from_millis(self.pulse_ms),
            gap: Duration::from_millis(self.gap_ms),
        }
    }

    /// Pulse shape for echoing a player's click.
    #[must_use]
    pub fn feedback(&self) -> crate::playback::PulseTiming {
        crate::playback::PulseTiming {
            pulse: Duration::from_millis(self.feedback_pulse_ms),
            gap: Duration::from_millis(self.feedback_gap_ms),
        }
    }

    /// Lead-in before the first replay pulse.
    #[must_use]
    pub fn lead_in(&self) -> Duration {
        Duration::from_millis(self.lead_in_ms)
    }

    /// Settle delay after a completed round.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Total time from entering playback until input opens for a sequence
    /// of `len` tiles.
    #[must_use]
    pub fn replay_duration(&self, len: usize) -> Duration {
        let per_tile = self.pulse_ms + self.gap_ms;
        Duration::from_millis(self.lead_in_ms + per_tile * len as u64)
    }
}

/// Which key-value backend holds the high score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; nothing survives a restart.
    Memory,
    /// A JSON object file.
    #[default]
    Json,
    /// An SQLite database.
    Sqlite,
}

/// High-score persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend: "memory", "json" or "sqlite".
    #[serde(default)]
    pub backend: StoreBackend,
    /// File used by the json and sqlite backends.
    #[serde(default = "default_store_path")]
    pub path: std::path::PathBuf,
    /// Key the high score is stored under.
    #[serde(default = "default_store_key")]
    pub key: String,
    /// Use WAL mode (sqlite only).
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
            key: default_store_key(),
            wal_mode: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_store_path() -> std::path::PathBuf { "mindmatch_scores.json".into() }
fn default_store_key() -> String { "mindmatch_highscore".to_string() }
fn default_100() -> u64 { 100 }
fn default_200() -> u64 { 200 }
fn default_400() -> u64 { 400 }
fn default_500() -> u64 { 500 }
fn default_800() -> u64 { 800 }
