//! # Pacer Core Library
//!
//! Business logic for Pacer, a breathing pacer with habit-tracking
//! routines. Hosts (the `pacer` CLI, or any other front end) drive the
//! core and render what it returns; the core never touches a screen.
//!
//! ## Architecture
//!
//! - **Phase clock**: pure functions from elapsed time and a breathing
//!   pattern to the current phase and the countdown, plus a session state
//!   machine that the host polls
//! - **Ledger**: routines and aggregate XP/level/streak stats with daily
//!   rollover, persisted through a key-value store
//! - **Storage**: SQLite and in-memory key-value stores, TOML configuration
//!   and URL-style launch parameters
//!
//! ## Key Components
//!
//! - [`PacerSession`]: breathing session state machine
//! - [`Ledger`]: routine CRUD and completion accounting
//! - [`KvStore`]: storage seam the ledger writes through
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod ledger;
pub mod storage;

pub use clock::{compute_phase, remaining_secs, BreathingPattern, PacerSession, Phase, PhaseInfo, SessionSnapshot};
pub use error::{ConfigError, CoreError, PersistenceError, ValidationError};
pub use events::Event;
pub use ledger::{CalendarDate, Committed, Completion, Ledger, LedgerOptions, Routine, RoutineDraft, Stats};
pub use storage::{Config, KvStore, MemoryStore, SessionParams, SqliteStore};
