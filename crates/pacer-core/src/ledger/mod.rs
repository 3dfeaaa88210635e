mod date;
#[allow(clippy::module_inception)]
mod ledger;
mod options;
mod routine;
mod stats;
mod xp;

pub use date::{empty_as_none, CalendarDate};
pub use ledger::{Committed, Completion, Ledger, RoutineDraft, ROUTINES_KEY, STATS_KEY};
pub use options::{
    LedgerOptions, SeedRoutine, DEFAULT_DURATION_SECS, MAX_DURATION_SECS, MAX_TITLE_CHARS,
    MIN_DURATION_SECS, MIN_XP,
};
pub use routine::{display_order, random_emoji, DayCounts, Routine};
pub use stats::Stats;
pub use xp::{level_for, xp_gain, LevelProgress, XP_PER_LEVEL, XP_PER_TEN_SECS};
