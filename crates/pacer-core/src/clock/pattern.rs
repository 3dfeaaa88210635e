use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Shortest allowed segment, in seconds.
pub const MIN_SEGMENT_SECS: u32 = 1;
/// Longest allowed segment, in seconds.
pub const MAX_SEGMENT_SECS: u32 = 30;

/// Inhale / hold / exhale lengths in whole seconds.
///
/// Every segment is within `MIN_SEGMENT_SECS..=MAX_SEGMENT_SECS`, so the
/// cycle is never empty and no phase has zero length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPattern")]
pub struct BreathingPattern {
    inhale_secs: u32,
    hold_secs: u32,
    exhale_secs: u32,
}

#[derive(Deserialize)]
struct RawPattern {
    inhale_secs: u32,
    hold_secs: u32,
    exhale_secs: u32,
}

impl TryFrom<RawPattern> for BreathingPattern {
    type Error = ValidationError;

    fn try_from(raw: RawPattern) -> Result<Self, Self::Error> {
        Self::new(raw.inhale_secs, raw.hold_secs, raw.exhale_secs)
    }
}

impl BreathingPattern {
    /// # Errors
    /// Returns `MalformedPattern` if any segment is outside 1-30 seconds.
    pub fn new(inhale_secs: u32, hold_secs: u32, exhale_secs: u32) -> Result<Self, ValidationError> {
        for (name, value) in [
            ("inhale", inhale_secs),
            ("hold", hold_secs),
            ("exhale", exhale_secs),
        ] {
            if !(MIN_SEGMENT_SECS..=MAX_SEGMENT_SECS).contains(&value) {
                return Err(ValidationError::MalformedPattern {
                    input: format!("{inhale_secs}-{hold_secs}-{exhale_secs}"),
                    message: format!(
                        "{name} must be {MIN_SEGMENT_SECS}-{MAX_SEGMENT_SECS} seconds (got {value})"
                    ),
                });
            }
        }
        Ok(Self {
            inhale_secs,
            hold_secs,
            exhale_secs,
        })
    }

    /// Parse `input`, falling back to the default 4-2-4 pattern on any error.
    pub fn parse_or_default(input: &str) -> Self {
        input.parse().unwrap_or_else(|err| {
            tracing::debug!("using default breathing pattern: {err}");
            Self::default()
        })
    }

    pub fn inhale_secs(&self) -> u32 {
        self.inhale_secs
    }

    pub fn hold_secs(&self) -> u32 {
        self.hold_secs
    }

    pub fn exhale_secs(&self) -> u32 {
        self.exhale_secs
    }

    pub fn inhale_ms(&self) -> u64 {
        u64::from(self.inhale_secs) * 1000
    }

    pub fn hold_ms(&self) -> u64 {
        u64::from(self.hold_secs) * 1000
    }

    pub fn exhale_ms(&self) -> u64 {
        u64::from(self.exhale_secs) * 1000
    }

    pub fn cycle_secs(&self) -> u32 {
        self.inhale_secs + self.hold_secs + self.exhale_secs
    }

    pub fn cycle_ms(&self) -> u64 {
        u64::from(self.cycle_secs()) * 1000
    }
}

impl Default for BreathingPattern {
    fn default() -> Self {
        Self {
            inhale_secs: 4,
            hold_secs: 2,
            exhale_secs: 4,
        }
    }
}

/// Accepts three numbers separated by any run of non-digits (`4-2-4`,
/// `4,2,4`, `4 2 4`).
impl FromStr for BreathingPattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |message: &str| ValidationError::MalformedPattern {
            input: s.to_string(),
            message: message.to_string(),
        };

        let parts = s
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u32>().map_err(|_| malformed("segment is too large")))
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [inhale, hold, exhale] => Self::new(*inhale, *hold, *exhale).map_err(|err| match err {
                ValidationError::MalformedPattern { message, .. } => malformed(&message),
                other => other,
            }),
            _ => Err(malformed("expected three numbers such as 4-2-4")),
        }
    }
}

impl fmt::Display for BreathingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.inhale_secs, self.hold_secs, self.exhale_secs)
    }
}
