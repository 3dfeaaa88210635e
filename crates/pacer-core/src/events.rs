use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::BreathingPattern;

/// Notifications the core hands back to the host.
/// The host renders them (toasts, sounds); the core never does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        total_secs: u32,
        pattern: BreathingPattern,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Emitted once per session.
    SessionFinished {
        total_secs: u32,
        at: DateTime<Utc>,
    },
    SessionCancelled {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    RoutineCompleted {
        routine_id: String,
        title: String,
        xp_gain: u64,
        total_xp: u64,
        level: u32,
        streak: u32,
        at: DateTime<Utc>,
    },
    /// Total XP crossed into a new level.
    LevelUp {
        level: u32,
        at: DateTime<Utc>,
    },
}
