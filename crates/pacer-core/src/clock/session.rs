//! Breathing session state machine.
//!
//! A session is a countdown plus a breathing pattern. Like the rest of the
//! clock it does not use internal threads: the host polls it at whatever
//! cadence it likes and every derived value comes from `now - started_at`.
//!
//! ## State Transitions
//!
//! ```text
//! Running -> Finished
//! Running -> Cancelled
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = PacerSession::start(20, BreathingPattern::default())?;
//! // In a loop:
//! let poll = session.poll(); // poll.event is Some(SessionFinished) exactly once
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::pattern::BreathingPattern;
use super::phase::{compute_phase, remaining_secs, total_ms, Phase};
use crate::error::ValidationError;
use crate::events::Event;

/// Longest session accepted by `PacerSession::start`, in seconds.
pub const MAX_SESSION_SECS: u32 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Running,
    Finished,
    Cancelled,
}

/// Render-ready view of a session at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub remaining_secs: u32,
    pub phase: Phase,
    /// 0.0 .. 1.0 progress within the current phase.
    pub progress: f64,
    pub finished: bool,
}

/// Result of one poll: the snapshot, plus the finish event the first time
/// the countdown is observed at zero.
#[derive(Debug, Clone)]
pub struct SessionPoll {
    pub snapshot: SessionSnapshot,
    pub event: Option<Event>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacerSession {
    total_secs: u32,
    pattern: BreathingPattern,
    state: SessionState,
    /// Start instant, epoch milliseconds.
    started_at_ms: u64,
    /// Instant the session was cancelled; snapshots freeze here.
    #[serde(default)]
    cancelled_at_ms: Option<u64>,
}

impl PacerSession {
    /// Start a session now.
    ///
    /// # Errors
    /// Returns `InvalidValue` if `total_secs` is zero or longer than a day.
    pub fn start(total_secs: u32, pattern: BreathingPattern) -> Result<(Self, Event), ValidationError> {
        Self::start_at(total_secs, pattern, now_ms())
    }

    /// Start a session at the given epoch-millisecond instant.
    pub fn start_at(
        total_secs: u32,
        pattern: BreathingPattern,
        now_ms: u64,
    ) -> Result<(Self, Event), ValidationError> {
        if total_secs == 0 || total_secs > MAX_SESSION_SECS {
            return Err(ValidationError::InvalidValue {
                field: "total_secs".into(),
                message: format!("must be 1-{MAX_SESSION_SECS} seconds (got {total_secs})"),
            });
        }
        tracing::info!(total_secs, %pattern, "breathing session started");
        let session = Self {
            total_secs,
            pattern,
            state: SessionState::Running,
            started_at_ms: now_ms,
            cancelled_at_ms: None,
        };
        let event = Event::SessionStarted {
            total_secs,
            pattern,
            at: Utc::now(),
        };
        Ok((session, event))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.pattern
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn elapsed_ms_at(&self, now_ms: u64) -> u64 {
        let end = self.cancelled_at_ms.map_or(now_ms, |c| c.min(now_ms));
        end.saturating_sub(self.started_at_ms)
    }

    /// Derived view at `now_ms`. Pure: never changes the session.
    pub fn snapshot_at(&self, now_ms: u64) -> SessionSnapshot {
        let elapsed = self.elapsed_ms_at(now_ms);
        let remaining = remaining_secs(self.total_secs, elapsed);
        // Once the countdown is over the circle rests where it stopped.
        let phase_elapsed = elapsed.min(total_ms(self.total_secs));
        let info = compute_phase(phase_elapsed, &self.pattern);
        SessionSnapshot {
            state: match self.state {
                SessionState::Running if remaining == 0 => SessionState::Finished,
                other => other,
            },
            remaining_secs: remaining,
            phase: info.phase,
            progress: info.progress,
            finished: self.state != SessionState::Cancelled && remaining == 0,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_at(now_ms())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Call periodically. Returns `Some(Event::SessionFinished)` the first
    /// time the countdown reaches zero and `None` on every other call.
    pub fn tick_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        let elapsed = self.elapsed_ms_at(now_ms);
        if remaining_secs(self.total_secs, elapsed) > 0 {
            return None;
        }
        self.state = SessionState::Finished;
        tracing::info!(total_secs = self.total_secs, "breathing session finished");
        Some(Event::SessionFinished {
            total_secs: self.total_secs,
            at: Utc::now(),
        })
    }

    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms())
    }

    /// Tick and snapshot in one step.
    pub fn poll_at(&mut self, now_ms: u64) -> SessionPoll {
        let event = self.tick_at(now_ms);
        SessionPoll {
            snapshot: self.snapshot_at(now_ms),
            event,
        }
    }

    pub fn poll(&mut self) -> SessionPoll {
        self.poll_at(now_ms())
    }

    /// Stop a running session without finishing it.
    pub fn cancel_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        let elapsed = self.elapsed_ms_at(now_ms);
        self.state = SessionState::Cancelled;
        self.cancelled_at_ms = Some(now_ms.max(self.started_at_ms));
        tracing::info!(elapsed_ms = elapsed, "breathing session cancelled");
        Some(Event::SessionCancelled {
            remaining_secs: remaining_secs(self.total_secs, elapsed),
            at: Utc::now(),
        })
    }

    pub fn cancel(&mut self) -> Option<Event> {
        self.cancel_at(now_ms())
    }
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn session() -> PacerSession {
        PacerSession::start_at(20, BreathingPattern::default(), T0).unwrap().0
    }

    #[test]
    fn start_rejects_zero_duration() {
        assert!(PacerSession::start_at(0, BreathingPattern::default(), T0).is_err());
        assert!(PacerSession::start_at(MAX_SESSION_SECS + 1, BreathingPattern::default(), T0).is_err());
    }

    #[test]
    fn start_emits_started_event() {
        let (_, event) = PacerSession::start_at(20, BreathingPattern::default(), T0).unwrap();
        assert!(matches!(event, Event::SessionStarted { total_secs: 20, .. }));
    }

    #[test]
    fn snapshot_follows_elapsed_time() {
        let s = session();
        let snap = s.snapshot_at(T0 + 5000);
        assert_eq!(snap.state, SessionState::Running);
        assert_eq!(snap.remaining_secs, 15);
        assert_eq!(snap.phase, Phase::Hold);
        assert!((snap.progress - 0.5).abs() < 1e-9);
        assert!(!snap.finished);
    }

    #[test]
    fn finish_fires_exactly_once() {
        let mut s = session();
        assert!(s.poll_at(T0 + 19_999).event.is_none());

        let first = s.poll_at(T0 + 20_000);
        assert!(matches!(first.event, Some(Event::SessionFinished { .. })));
        assert!(first.snapshot.finished);
        assert_eq!(first.snapshot.remaining_secs, 0);

        // A second poller observing the same or later instants sees no new event.
        assert!(s.poll_at(T0 + 20_000).event.is_none());
        assert!(s.poll_at(T0 + 30_000).event.is_none());
        assert_eq!(s.state(), SessionState::Finished);
    }

    #[test]
    fn late_first_poll_still_fires() {
        let mut s = session();
        let poll = s.poll_at(T0 + 90_000);
        assert!(poll.event.is_some());
        assert_eq!(poll.snapshot.remaining_secs, 0);
    }

    #[test]
    fn snapshot_is_pure() {
        let s = session();
        assert_eq!(s.snapshot_at(T0 + 7_123), s.snapshot_at(T0 + 7_123));
        // Snapshots alone never transition the session.
        let _ = s.snapshot_at(T0 + 60_000);
        assert_eq!(s.state(), SessionState::Running);
    }

    #[test]
    fn snapshot_reports_finished_before_tick() {
        let s = session();
        let snap = s.snapshot_at(T0 + 20_000);
        assert!(snap.finished);
        assert_eq!(snap.state, SessionState::Finished);
    }

    #[test]
    fn cancel_freezes_and_suppresses_finish() {
        let mut s = session();
        let event = s.cancel_at(T0 + 3_000);
        assert!(matches!(event, Some(Event::SessionCancelled { remaining_secs: 17, .. })));
        assert_eq!(s.state(), SessionState::Cancelled);

        let later = s.poll_at(T0 + 60_000);
        assert!(later.event.is_none());
        assert!(!later.snapshot.finished);
        assert_eq!(later.snapshot.remaining_secs, 17);

        assert!(s.cancel_at(T0 + 61_000).is_none());
    }

    #[test]
    fn clock_before_start_reads_full_duration() {
        let s = session();
        assert_eq!(s.snapshot_at(T0 - 5_000).remaining_secs, 20);
    }
}
