mod pattern;
mod phase;
mod session;

pub use pattern::{BreathingPattern, MAX_SEGMENT_SECS, MIN_SEGMENT_SECS};
pub use phase::{compute_phase, remaining_secs, Phase, PhaseInfo};
pub use session::{PacerSession, SessionPoll, SessionSnapshot, SessionState, MAX_SESSION_SECS};
