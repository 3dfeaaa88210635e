//! Phase derivation for the breathing pacer.
//!
//! Everything here is a pure function of elapsed milliseconds, so any
//! number of pollers observing the same instant agree on the result.

use serde::{Deserialize, Serialize};

use super::pattern::BreathingPattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
}

impl Phase {
    /// Instruction shown to the user during this phase.
    pub fn instruction(&self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe in",
            Phase::Hold => "Hold",
            Phase::Exhale => "Breathe out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseInfo {
    pub phase: Phase,
    /// 0.0 .. 1.0 progress within the current phase.
    pub progress: f64,
}

/// Locate `elapsed_ms` within the repeating inhale/hold/exhale cycle.
///
/// Defined for any elapsed value, including past the end of a session;
/// callers clamp the remaining time separately.
pub fn compute_phase(elapsed_ms: u64, pattern: &BreathingPattern) -> PhaseInfo {
    let t = elapsed_ms % pattern.cycle_ms();
    let inhale_ms = pattern.inhale_ms();
    let hold_ms = pattern.hold_ms();

    if t < inhale_ms {
        PhaseInfo {
            phase: Phase::Inhale,
            progress: t as f64 / inhale_ms as f64,
        }
    } else if t < inhale_ms + hold_ms {
        PhaseInfo {
            phase: Phase::Hold,
            progress: (t - inhale_ms) as f64 / hold_ms as f64,
        }
    } else {
        PhaseInfo {
            phase: Phase::Exhale,
            progress: (t - inhale_ms - hold_ms) as f64 / pattern.exhale_ms() as f64,
        }
    }
}

/// Whole seconds left to display, rounded up.
///
/// Counts N, N-1, ..., 1, 0 and is 0 exactly when `elapsed_ms >= total_secs * 1000`.
pub fn remaining_secs(total_secs: u32, elapsed_ms: u64) -> u32 {
    let remaining_ms = total_ms(total_secs).saturating_sub(elapsed_ms);
    // Bounded by total_secs, so the narrowing cannot truncate.
    remaining_ms.div_ceil(1000) as u32
}

pub(crate) fn total_ms(total_secs: u32) -> u64 {
    u64::from(total_secs) * 1000
}
