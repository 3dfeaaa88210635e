use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::date::CalendarDate;
use super::xp::level_for;

const EMOJI_PALETTE: [&str; 10] = ["✨", "💪", "🧘", "🌟", "💫", "🎯", "🚀", "💎", "🔥", "⭐"];

/// Pick a cosmetic emoji for a routine created without one.
pub fn random_emoji() -> String {
    EMOJI_PALETTE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("✨")
        .to_string()
}

/// Completion counters. `today` is only meaningful for `today_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCounts {
    pub total: u64,
    pub today: u64,
    pub today_date: CalendarDate,
}

impl DayCounts {
    pub fn new(today: CalendarDate) -> Self {
        Self {
            total: 0,
            today: 0,
            today_date: today,
        }
    }

    /// Reset the daily counter if it belongs to another day.
    /// Returns true when a reset happened.
    pub fn roll_over(&mut self, today: CalendarDate) -> bool {
        if self.today_date == today {
            return false;
        }
        self.today = 0;
        self.today_date = today;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub title: String,
    pub duration_secs: u32,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub pinned: bool,
    pub counts: DayCounts,
    #[serde(default)]
    pub last_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub routine_xp: u64,
    #[serde(default = "first_level")]
    pub routine_level: u32,
}

fn first_level() -> u32 {
    1
}

impl Routine {
    /// A fresh routine with zero counts and XP. Inputs are assumed validated.
    pub fn new(title: String, duration_secs: u32, emoji: String, now: DateTime<Utc>, today: CalendarDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            duration_secs,
            emoji,
            pinned: false,
            counts: DayCounts::new(today),
            last_completed_at: None,
            created_at: now,
            updated_at: now,
            routine_xp: 0,
            routine_level: 1,
        }
    }

    /// Completions recorded on `today`, without mutating the routine.
    pub fn completions_on(&self, today: CalendarDate) -> u64 {
        if self.counts.today_date == today {
            self.counts.today
        } else {
            0
        }
    }

    pub fn done_today(&self, today: CalendarDate) -> bool {
        self.completions_on(today) > 0
    }

    /// Count one completion and credit `xp_gain`. Caller rolls over first.
    pub(crate) fn record_completion(&mut self, xp_gain: u64, now: DateTime<Utc>) {
        self.counts.total += 1;
        self.counts.today += 1;
        self.last_completed_at = Some(now);
        self.routine_xp = self.routine_xp.saturating_add(xp_gain);
        self.routine_level = level_for(self.routine_xp);
    }

    /// Restore derived fields after loading from storage. Returns true when
    /// the stored record needs rewriting (a missing emoji was filled in).
    pub(crate) fn normalize(&mut self) -> bool {
        self.routine_level = level_for(self.routine_xp);
        if self.emoji.is_empty() {
            self.emoji = random_emoji();
            return true;
        }
        false
    }
}

/// Listing order: pinned first, then most recently touched.
pub fn display_order(a: &Routine, b: &Routine) -> std::cmp::Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| b.updated_at.cmp(&a.updated_at))
}
