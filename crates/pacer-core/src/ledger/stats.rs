use serde::{Deserialize, Serialize};

use super::date::{empty_as_none, CalendarDate};
use super::xp::{level_for, LevelProgress};

/// Aggregate progress across all routines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub xp: u64,
    /// Always `level_for(xp)`; recomputed on every change and on load.
    pub level: u32,
    /// Consecutive calendar days with at least one completion.
    pub streak: u32,
    #[serde(with = "empty_as_none", default)]
    pub last_completion_date: Option<CalendarDate>,
    pub today_total: u64,
    pub today_date: CalendarDate,
}

impl Stats {
    pub fn new(today: CalendarDate) -> Self {
        Self {
            xp: 0,
            level: 1,
            streak: 0,
            last_completion_date: None,
            today_total: 0,
            today_date: today,
        }
    }

    /// Reset `today_total` if it belongs to another day.
    /// Returns true when a reset happened.
    pub fn roll_over(&mut self, today: CalendarDate) -> bool {
        if self.today_date == today {
            return false;
        }
        self.today_total = 0;
        self.today_date = today;
        true
    }

    /// Credit one completion on `today`. Caller rolls over first.
    pub(crate) fn record_completion(&mut self, xp_gain: u64, today: CalendarDate) {
        self.xp = self.xp.saturating_add(xp_gain);
        self.level = level_for(self.xp);

        match self.last_completion_date {
            Some(last) if last == today => {}
            Some(last) if last.is_yesterday_of(today) => self.streak += 1,
            _ => self.streak = 1,
        }
        self.last_completion_date = Some(today);
        self.today_total += 1;
    }

    /// Streak as it should be shown on `today`: a streak whose last day is
    /// neither today nor yesterday is already broken.
    pub fn current_streak(&self, today: CalendarDate) -> u32 {
        match self.last_completion_date {
            Some(last) if last == today || last.is_yesterday_of(today) => self.streak,
            _ => 0,
        }
    }

    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress::of(self.xp)
    }

    pub(crate) fn normalize(&mut self) {
        self.level = level_for(self.xp);
    }
}
