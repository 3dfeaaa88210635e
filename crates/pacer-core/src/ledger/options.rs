use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Smallest XP reward for any completion.
pub const MIN_XP: u64 = 10;
pub const MIN_DURATION_SECS: u32 = 10;
pub const MAX_DURATION_SECS: u32 = 900;
pub const DEFAULT_DURATION_SECS: u32 = 20;
pub const MAX_TITLE_CHARS: usize = 40;

/// A routine offered to new users with an empty ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRoutine {
    pub title: String,
    pub duration_secs: u32,
    pub emoji: String,
}

impl SeedRoutine {
    fn new(title: &str, duration_secs: u32, emoji: &str) -> Self {
        Self {
            title: title.into(),
            duration_secs,
            emoji: emoji.into(),
        }
    }
}

/// Tunables for one ledger. Every product variant is a different value of
/// this struct rather than a different copy of the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOptions {
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
    pub default_duration_secs: u32,
    pub min_xp: u64,
    pub max_title_chars: usize,
    pub seeds: Vec<SeedRoutine>,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            min_duration_secs: MIN_DURATION_SECS,
            max_duration_secs: MAX_DURATION_SECS,
            default_duration_secs: DEFAULT_DURATION_SECS,
            min_xp: MIN_XP,
            max_title_chars: MAX_TITLE_CHARS,
            seeds: vec![
                SeedRoutine::new("Deep breath", 20, "🌬️"),
                SeedRoutine::new("Drink water", 15, "💧"),
                SeedRoutine::new("Shoulder rolls", 60, "🤸"),
            ],
        }
    }
}

impl LedgerOptions {
    /// Trim `title` and check its length in characters.
    ///
    /// # Errors
    /// Returns `TitleLength` for empty titles or titles over the limit.
    pub fn validate_title(&self, title: &str) -> Result<String, ValidationError> {
        let trimmed = title.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > self.max_title_chars {
            return Err(ValidationError::TitleLength {
                len,
                min: 1,
                max: self.max_title_chars,
            });
        }
        Ok(trimmed.to_string())
    }

    /// # Errors
    /// Returns `DurationOutOfRange` outside `min_duration_secs..=max_duration_secs`.
    pub fn validate_duration(&self, duration_secs: u32) -> Result<u32, ValidationError> {
        if !(self.min_duration_secs..=self.max_duration_secs).contains(&duration_secs) {
            return Err(ValidationError::DurationOutOfRange {
                value: duration_secs,
                min: self.min_duration_secs,
                max: self.max_duration_secs,
            });
        }
        Ok(duration_secs)
    }
}
