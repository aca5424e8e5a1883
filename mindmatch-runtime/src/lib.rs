//! # mindmatch-runtime — Real-Time Driver for Mind Match
//!
//! `mindmatch-core` never reads a clock; this crate runs a
//! [`GameSession`](mindmatch_core::GameSession) against real time.
//!
//! ## Architecture
//!
//! ```text
//!   SessionHandle ──mpsc Command──▶ ┌──────────────────────────┐
//!        ▲                          │  driver task (tokio)     │
//!        └──────oneshot reply────── │  GameSession             │
//!                                   │  sleep_until(deadline)   │
//!   subscribers ◀──broadcast──────  └──────────────────────────┘
//! ```
//!
//! The session lives on exactly one task. Commands are applied in the
//! order they arrive, and the task sleeps until the session's next timer
//! deadline in between, so pulses and round transitions fire on time
//! without any polling.
//!
//! ## Modules
//!
//! - `driver` — [`spawn_session`] and the [`SessionHandle`] command API
//! - `telemetry` — `tracing` subscriber setup from [`GeneralConfig`](mindmatch_core::config::GeneralConfig)

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod driver;
pub mod error;
pub mod telemetry;

pub use driver::{spawn_from_config, spawn_session, SessionHandle};
pub use error::RuntimeError;
pub use telemetry::init_tracing;
