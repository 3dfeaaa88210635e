//! XP reward and level arithmetic.

use serde::{Deserialize, Serialize};

/// XP needed to advance one level.
pub const XP_PER_LEVEL: u64 = 100;

/// XP awarded per ten seconds of routine duration, before the floor.
pub const XP_PER_TEN_SECS: u64 = 5;

/// Reward for completing a routine of `duration_secs`.
///
/// `round(duration / 10) * 5`, never less than `min_xp`. Halves round up.
pub fn xp_gain(duration_secs: u32, min_xp: u64) -> u64 {
    let tens = (u64::from(duration_secs) + 5) / 10;
    (tens * XP_PER_TEN_SECS).max(min_xp)
}

/// Level for a running XP total. Level 1 starts at 0 XP.
pub fn level_for(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp_in_level: u64,
    pub xp_to_next: u64,
}

impl LevelProgress {
    pub fn of(xp: u64) -> Self {
        let xp_in_level = xp % XP_PER_LEVEL;
        Self {
            level: level_for(xp),
            xp_in_level,
            xp_to_next: XP_PER_LEVEL - xp_in_level,
        }
    }

    /// 0.0 .. 100.0 fill of the level bar.
    pub fn percent(&self) -> f64 {
        self.xp_in_level as f64 / XP_PER_LEVEL as f64 * 100.0
    }
}
